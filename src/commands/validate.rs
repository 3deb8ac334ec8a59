use crate::cli::ValidateArgs;
use crate::gaps::{parse_path_line, path_gaps, GapRegistry};
use crate::graph::Assembly;
use crate::utils::{open_reader, Result};
use std::io::BufRead;

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    pass: usize,
    fail: usize,
    gaps: usize,
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    let asm = Assembly::load(&args.graph_path, &args.contigs_path, args.kmer)?;
    log::info!("Checking `{}`", args.paths_path.display());
    let summary = check_paths(open_reader(&args.paths_path)?, &asm)?;

    let total = summary.pass + summary.fail;
    let pass_percentage = (summary.pass as f64 / total.max(1) as f64) * 100.0;
    let fail_percentage = (summary.fail as f64 / total.max(1) as f64) * 100.0;
    log::info!("Distinct gaps: {}", summary.gaps);

    match summary.fail {
        0 => {
            log::info!("Validation successful. Paths pass={}", summary.pass);
            Ok(())
        }
        _ => {
            log::info!(
                "Validation failed. Paths pass={} ({:.2}%), fail={} ({:.2}%)",
                summary.pass,
                pass_percentage,
                summary.fail,
                fail_percentage
            );
            Err(format!("{} paths failed validation", summary.fail))
        }
    }
}

fn check_paths<R: BufRead>(reader: R, asm: &Assembly) -> Result<Summary> {
    let mut registry = GapRegistry::new();
    let mut summary = Summary::default();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read paths: {}", e))?;
        match check_line(&line, asm, &mut registry) {
            Ok(true) => summary.pass += 1,
            Ok(false) => {}
            Err(e) => {
                log::error!("Error at path line {}: {}", line_number + 1, e);
                summary.fail += 1;
            }
        }
    }
    summary.gaps = registry.len();
    Ok(summary)
}

/// Returns false for blank lines.
fn check_line(line: &str, asm: &Assembly, registry: &mut GapRegistry) -> Result<bool> {
    let Some(path) = parse_path_line(&asm.dict, line)? else {
        return Ok(false);
    };
    let gaps = path_gaps(&path.nodes)?;
    for pair in path.nodes.windows(2) {
        let (u, v) = (pair[0], pair[1]);
        if u.is_gap() || v.is_gap() {
            continue;
        }
        if asm.graph.edge_distance(u, v).is_none() {
            return Err(format!(
                "No edge between {} and {} in path '{}'",
                asm.dict.node(u),
                asm.dict.node(v),
                path.label
            ));
        }
    }
    for gap in gaps {
        registry.insert(gap);
    }
    Ok(true)
}
