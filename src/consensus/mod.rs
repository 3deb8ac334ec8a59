mod align;
mod merge;
mod multi;
mod pairwise;

pub use align::{
    GlobalAligner, MultiAligner, MultiAlignment, PairwiseAligner, PairwiseAlignment, StarAligner,
};
pub use merge::{consensus_base, merge_overlap, merge_path, OverlapMerge};
pub use multi::common_prefix_suffix;

use crate::graph::{Assembly, ContigPath, Sequence};
use crate::utils::Result;

/// A consensus contig yet to be given an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigDraft {
    /// Nodes shared by all candidates before the divergent cores.
    pub prefix_len: usize,
    /// Nodes shared by all candidates after the divergent cores.
    pub suffix_len: usize,
    pub sequence: Sequence,
    pub coverage: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GapConsensus {
    /// The candidates collapse onto one existing path.
    Existing(ContigPath),
    /// A new contig replaces the divergent cores of the candidates.
    NewContig(ContigDraft),
    /// The candidates are too different to be merged.
    Dissimilar { identity: f32 },
}

/// Builds the consensus of the candidate paths of one gap. Every
/// candidate starts at the gap's source and ends at its destination.
pub struct ConsensusBuilder<'a> {
    asm: &'a Assembly,
    identity: f32,
    pairwise: &'a dyn PairwiseAligner,
    multi: &'a dyn MultiAligner,
}

impl<'a> ConsensusBuilder<'a> {
    pub fn new(
        asm: &'a Assembly,
        identity: f32,
        pairwise: &'a dyn PairwiseAligner,
        multi: &'a dyn MultiAligner,
    ) -> Self {
        Self {
            asm,
            identity,
            pairwise,
            multi,
        }
    }

    pub fn align(&self, solutions: &[ContigPath]) -> Result<GapConsensus> {
        match solutions.len() {
            0 | 1 => Err(format!(
                "Consensus needs at least two candidate paths, got {}",
                solutions.len()
            )),
            2 => self.align_pair(&solutions[0], &solutions[1]),
            _ => self.align_multi(solutions),
        }
    }
}

/// Shortest over longest length; alignment cannot reach a higher identity.
fn length_ratio<S: AsRef<[u8]>>(seqs: &[S]) -> f32 {
    let min = seqs.iter().map(|s| s.as_ref().len()).min().unwrap_or(0);
    let max = seqs.iter().map(|s| s.as_ref().len()).max().unwrap_or(0);
    if max == 0 {
        return 0.0;
    }
    min as f32 / max as f32
}
