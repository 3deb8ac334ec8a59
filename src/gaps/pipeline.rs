use super::{
    ContigSynthesizer, GapOutcome, GapRegistry, GapResolution, GapResolver, GapStats,
    ResolverParams, SeenContigs,
};
use crate::consensus::{GapConsensus, MultiAligner, PairwiseAligner};
use crate::graph::Assembly;
use crate::utils::Result;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::io::Write;

/// Resolves every pending gap of `registry`. Gaps are searched and
/// aligned in parallel on the current rayon pool, then committed in
/// registry order so contig ids do not depend on scheduling.
pub fn fill_gaps<W: Write>(
    asm: &mut Assembly,
    registry: &mut GapRegistry,
    params: ResolverParams,
    pairwise: &dyn PairwiseAligner,
    multi: &dyn MultiAligner,
    synthesizer: &mut ContigSynthesizer<W>,
    seen: &mut SeenContigs,
) -> Result<GapStats> {
    let gaps = registry.pending();
    log::info!("Resolving {} gaps", gaps.len());

    let resolver = GapResolver::new(asm, params, pairwise, multi);
    let outcomes = gaps
        .par_iter()
        .map(|gap| resolver.resolve_gap(gap))
        .collect::<Result<Vec<_>>>()?;

    let mut stats = GapStats {
        ambiguous: gaps.len(),
        ..GapStats::default()
    };
    for (gap, outcome) in gaps.iter().zip(outcomes) {
        stats.record(&outcome);
        let resolution = match outcome {
            GapOutcome::SinglePath(path) => GapResolution::Resolved(path),
            GapOutcome::Consensus {
                solutions,
                consensus,
            } => {
                seen.mark_paths(&solutions, true);
                match consensus {
                    GapConsensus::Existing(path) => GapResolution::Resolved(path),
                    GapConsensus::NewContig(draft) => GapResolution::Resolved(
                        synthesizer.synthesize(&mut asm.dict, &solutions, &draft)?,
                    ),
                    GapConsensus::Dissimilar { .. } => GapResolution::Unresolved,
                }
            }
            GapOutcome::TooComplex { .. }
            | GapOutcome::TooManyPaths(_)
            | GapOutcome::NoPaths
            | GapOutcome::Dissimilar { .. } => GapResolution::Unresolved,
        };
        registry.resolve(gap, resolution)?;
    }
    Ok(stats)
}
