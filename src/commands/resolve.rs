use crate::cli::ResolveArgs;
use crate::consensus::{GlobalAligner, StarAligner};
use crate::gaps::{
    fill_gaps, load_paths, write_paths, ContigSynthesizer, GapRegistry, ResolverParams,
    SeenContigs,
};
use crate::graph::{write_dot, Assembly, ContigIdAllocator};
use crate::utils::{create_writer, open_writer, Result};
use rayon::ThreadPoolBuilder;
use std::{io::Write, time};

pub fn resolve(args: ResolveArgs) -> Result<()> {
    let start_timer = time::Instant::now();

    let mut asm = Assembly::load(&args.graph_path, &args.contigs_path, args.kmer)?;
    let mut registry = GapRegistry::new();
    let scaffolds = load_paths(&args.paths_path, &asm.dict, &mut registry)?;

    let mut allocator =
        ContigIdAllocator::new(&asm.dict, scaffolds.iter().map(|p| p.label.as_str()));
    if let Some(last) = scaffolds.last() {
        allocator.set_starting_point(&last.label);
    }

    let mut contigs_fasta: Vec<u8> = Vec::new();
    let mut synthesizer = ContigSynthesizer::new(allocator, &mut contigs_fasta);
    let mut seen = SeenContigs::new(asm.num_input_contigs());
    let params = ResolverParams {
        dist_error: args.dist_error,
        max_branches: args.branches,
        max_cost: args.max_cost,
        identity: args.identity,
    };

    let pool = initialize_thread_pool(args.num_threads)?;
    let stats = pool.install(|| {
        fill_gaps(
            &mut asm,
            &mut registry,
            params,
            &GlobalAligner,
            &StarAligner,
            &mut synthesizer,
            &mut seen,
        )
    })?;
    let pending = synthesizer.finish()?;
    log::debug!("Synthesized {} contigs", pending.len());

    seen.unmark_used(&registry, &scaffolds);
    let mut path_lines: Vec<u8> = Vec::new();
    write_paths(&mut path_lines, &asm.dict, &scaffolds, &registry, &seen)?;

    let graph_dot = if args.write_graph {
        pending.apply(&mut asm.graph, asm.k)?;
        let mut dot: Vec<u8> = Vec::new();
        write_dot(&mut dot, &asm.graph, &asm.dict, asm.k)?;
        Some(dot)
    } else {
        None
    };

    // No output file is touched until every fatal check has passed.
    write_output(&args.output_prefix, "fa", &contigs_fasta)?;
    write_output(&args.output_prefix, "path", &path_lines)?;
    if let Some(dot) = graph_dot {
        write_output(&args.output_prefix, "dot", &dot)?;
    }

    for line in stats.to_string().lines() {
        log::info!("{}", line);
    }

    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}

fn write_output(output_prefix: &str, output_suffix: &str, bytes: &[u8]) -> Result<()> {
    let mut writer = create_writer(output_prefix, output_suffix, open_writer)?;
    writer
        .write_all(bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| format!("Failed to write {}.{}: {}", output_prefix, output_suffix, e))
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("gapcon-{}", i))
        .start_handler(|_thread_index| {
            log::trace!("Initialized thread {:?}", std::thread::current().id());
        })
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    const DOT: &str = r#"digraph adj {
graph [k=3]
"0+" [l=6 C=10]
"1+" [l=8 C=10]
"2+" [l=8 C=20]
"3+" [l=6 C=10]
"4+" [l=6 C=10]
"5+" [l=6 C=10]
"6+" [l=6 C=10]
"0+" -> "1+"
"0+" -> "2+"
"1+" -> "3+"
"2+" -> "3+"
"4+" -> "5+"
"5+" -> "6+"
}
"#;

    const FASTA: &str = ">0\nAAAACG\n>1\nCGTTACGA\n>2\nCGTTTCGA\n>3\nGAGGGG\n\
>4\nTTTTAC\n>5\nACCCAT\n>6\nATGGGG\n";

    #[test]
    fn resolve_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.dot");
        let contigs_path = dir.path().join("contigs.fa");
        let paths_path = dir.path().join("scaffolds.path");
        fs::write(&graph_path, DOT).unwrap();
        fs::write(&contigs_path, FASTA).unwrap();
        fs::write(&paths_path, "10\t0+ 4N 3+\n11\t0+ 4N 3+ 4+ 2N 6+\n").unwrap();
        let prefix = dir.path().join("out").to_str().unwrap().to_string();

        resolve(ResolveArgs {
            contigs_path,
            graph_path,
            paths_path,
            output_prefix: prefix.clone(),
            kmer: 3,
            num_threads: 2,
            write_graph: true,
            dist_error: 0,
            branches: 4,
            identity: 0.8,
            max_cost: 100_000,
        })
        .unwrap();

        assert_eq!(
            fs::read_to_string(format!("{}.path", prefix)).unwrap(),
            "1\n2\n10\t0+ 12+ 3+\n11\t0+ 12+ 3+ 4+ 5+ 6+\n"
        );
        assert_eq!(
            fs::read_to_string(format!("{}.fa", prefix)).unwrap(),
            ">12 8 30 1+;2+\nCGTTWCGA\n"
        );
        let dot = fs::read_to_string(format!("{}.dot", prefix)).unwrap();
        assert!(dot.contains("\"12+\" [l=8 C=30]"));
        assert!(dot.contains("\"0+\" -> \"12+\"\n"));
        assert!(dot.contains("\"12+\" -> \"3+\"\n"));
    }

    #[test]
    fn fatal_resolution_writes_no_output() {
        // 1 and 2 share a sequence but are not reverse complements
        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.dot");
        let contigs_path = dir.path().join("contigs.fa");
        let paths_path = dir.path().join("scaffolds.path");
        fs::write(&graph_path, DOT).unwrap();
        fs::write(
            &contigs_path,
            ">0\nAAAACG\n>1\nCGTTACGA\n>2\nCGTTACGA\n>3\nGAGGGG\n\
>4\nTTTTAC\n>5\nACCCAT\n>6\nATGGGG\n",
        )
        .unwrap();
        fs::write(&paths_path, "10\t0+ 4N 3+\n").unwrap();
        let prefix = dir.path().join("out").to_str().unwrap().to_string();
        fs::write(format!("{}.fa", prefix), ">old\nACGT\n").unwrap();

        let result = resolve(ResolveArgs {
            contigs_path,
            graph_path,
            paths_path,
            output_prefix: prefix.clone(),
            kmer: 3,
            num_threads: 1,
            write_graph: true,
            dist_error: 0,
            branches: 4,
            identity: 0.8,
            max_cost: 100_000,
        });

        assert!(result.unwrap_err().contains("not palindromic"));
        assert_eq!(
            fs::read_to_string(format!("{}.fa", prefix)).unwrap(),
            ">old\nACGT\n"
        );
        assert!(!Path::new(&format!("{}.path", prefix)).exists());
        assert!(!Path::new(&format!("{}.dot", prefix)).exists());
    }

    #[test]
    fn mismatched_kmer_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.dot");
        let contigs_path = dir.path().join("contigs.fa");
        let paths_path = dir.path().join("scaffolds.path");
        fs::write(&graph_path, DOT).unwrap();
        fs::write(&contigs_path, FASTA).unwrap();
        fs::write(&paths_path, "10\t0+ 4N 3+\n").unwrap();

        let result = resolve(ResolveArgs {
            contigs_path,
            graph_path,
            paths_path,
            output_prefix: dir.path().join("out").to_str().unwrap().to_string(),
            kmer: 5,
            num_threads: 1,
            write_graph: false,
            dist_error: 6,
            branches: 4,
            identity: 0.9,
            max_cost: 100_000,
        });
        assert!(result.is_err());
    }
}
