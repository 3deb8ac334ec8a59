use super::merge::consensus_base;
use crate::graph::Sequence;
use bio::alignment::{pairwise::Aligner, AlignmentOperation};
use itertools::Itertools;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseAlignment {
    /// Columns on which both sequences carry the same base.
    pub matches: usize,
    /// Columns of the alignment, gaps included.
    pub length: usize,
    pub consensus: Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiAlignment {
    /// Consensus positions on which every sequence agrees.
    pub matches: usize,
    pub consensus: Sequence,
}

pub trait PairwiseAligner: Sync {
    fn align(&self, a: &[u8], b: &[u8]) -> PairwiseAlignment;
}

pub trait MultiAligner: Sync {
    fn align(&self, seqs: &[Sequence]) -> MultiAlignment;
}

type ScoreFunc = fn(u8, u8) -> i32;

fn score(a: u8, b: u8) -> i32 {
    if a == b {
        1i32
    } else {
        -1i32
    }
}

fn get_aligner(x_len: usize, y_len: usize) -> Aligner<ScoreFunc> {
    Aligner::with_capacity(x_len, y_len, -5, -1, score as ScoreFunc)
}

/// Global alignment of `x` against `y`, ignoring case.
fn global_ops(x: &[u8], y: &[u8]) -> Vec<AlignmentOperation> {
    let x = x.to_ascii_uppercase();
    let y = y.to_ascii_uppercase();
    let mut aligner = get_aligner(x.len(), y.len());
    aligner.global(&x, &y).operations
}

/// IUPAC code of two differing bases.
fn ambiguity_code(a: u8, b: u8) -> u8 {
    let pair = if a <= b { (a, b) } else { (b, a) };
    match pair {
        (b'A', b'C') => b'M',
        (b'A', b'G') => b'R',
        (b'A', b'T') => b'W',
        (b'C', b'G') => b'S',
        (b'C', b'T') => b'Y',
        (b'G', b'T') => b'K',
        _ => b'N',
    }
}

fn column_consensus(a: u8, b: u8) -> u8 {
    consensus_base(a, b).unwrap_or_else(|| {
        let code = ambiguity_code(a.to_ascii_uppercase(), b.to_ascii_uppercase());
        if a.is_ascii_lowercase() || b.is_ascii_lowercase() {
            code.to_ascii_lowercase()
        } else {
            code
        }
    })
}

/// Needleman-Wunsch alignment with affine gaps.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalAligner;

impl PairwiseAligner for GlobalAligner {
    fn align(&self, a: &[u8], b: &[u8]) -> PairwiseAlignment {
        let ops = global_ops(a, b);
        let mut consensus = Vec::with_capacity(ops.len());
        let mut matches = 0;
        let (mut i, mut j) = (0, 0);
        for op in &ops {
            match op {
                AlignmentOperation::Match => {
                    matches += 1;
                    consensus.push(column_consensus(a[i], b[j]));
                    i += 1;
                    j += 1;
                }
                AlignmentOperation::Subst => {
                    consensus.push(column_consensus(a[i], b[j]));
                    i += 1;
                    j += 1;
                }
                AlignmentOperation::Ins => {
                    consensus.push(a[i].to_ascii_lowercase());
                    i += 1;
                }
                AlignmentOperation::Del => {
                    consensus.push(b[j].to_ascii_lowercase());
                    j += 1;
                }
                _ => panic!("Unexpected operation in a global alignment: {op:?}"),
            }
        }
        PairwiseAlignment {
            matches,
            length: ops.len(),
            consensus,
        }
    }
}

/// Multiple alignment by aligning every sequence to a backbone and voting
/// on each backbone column. The backbone is the sequence whose length is
/// closest to all others.
#[derive(Debug, Default, Clone, Copy)]
pub struct StarAligner;

impl MultiAligner for StarAligner {
    fn align(&self, seqs: &[Sequence]) -> MultiAlignment {
        let seqs = seqs.iter().map(|s| s.to_ascii_uppercase()).collect_vec();
        let Some(backbone) = seqs.iter().min_by_key(|s| {
            seqs.iter()
                .map(|other| s.len().abs_diff(other.len()))
                .sum::<usize>()
        }) else {
            return MultiAlignment {
                matches: 0,
                consensus: Vec::new(),
            };
        };
        let aligns: Vec<Vec<AlignmentOperation>> = seqs
            .par_iter()
            .map(|seq| global_ops(seq, backbone))
            .collect();
        repair_consensus(backbone, &seqs, &aligns)
    }
}

//                  -    N     A     C     G     T
const SLOTS: [u8; 6] = [b'-', b'N', b'A', b'C', b'G', b'T'];

fn slot(base: u8) -> usize {
    match base {
        b'A' => 2,
        b'C' => 3,
        b'G' => 4,
        b'T' => 5,
        _ => 1,
    }
}

fn repair_consensus(
    backbone: &[u8],
    seqs: &[Sequence],
    aligns: &[Vec<AlignmentOperation>],
) -> MultiAlignment {
    let mut counts = vec![[0usize; 6]; backbone.len()];
    let mut inserts: Vec<Vec<Sequence>> = vec![Vec::new(); backbone.len() + 1];
    let mut matched = vec![0usize; backbone.len()];
    // Backbone positions bordering an insertion in any sequence.
    let mut near_insert = vec![false; backbone.len()];

    for (seq, operations) in seqs.iter().zip(aligns) {
        let mut x_pos = 0;
        let mut y_pos = 0;
        for (op, run) in &operations.iter().chunk_by(|op| **op) {
            let op_len = run.count();
            match op {
                AlignmentOperation::Match | AlignmentOperation::Subst => {
                    for (offset, &base) in seq[x_pos..x_pos + op_len].iter().enumerate() {
                        counts[y_pos + offset][slot(base)] += 1;
                        if op == AlignmentOperation::Match {
                            matched[y_pos + offset] += 1;
                        }
                    }
                    x_pos += op_len;
                    y_pos += op_len;
                }
                AlignmentOperation::Del => {
                    for count in &mut counts[y_pos..y_pos + op_len] {
                        count[0] += 1;
                    }
                    y_pos += op_len;
                }
                AlignmentOperation::Ins => {
                    inserts[y_pos].push(seq[x_pos..x_pos + op_len].to_vec());
                    if y_pos > 0 {
                        near_insert[y_pos - 1] = true;
                    }
                    if y_pos < backbone.len() {
                        near_insert[y_pos] = true;
                    }
                    x_pos += op_len;
                }
                _ => panic!("Unexpected operation in a global alignment: {op:?}"),
            }
        }
    }

    let mut consensus = Vec::with_capacity(backbone.len());
    let mut matches = 0;
    for (pos, count) in counts.iter().enumerate() {
        if inserts[pos].len() > seqs.len() / 2 {
            consensus.extend_from_slice(get_ins_consensus(&mut inserts[pos], seqs.len()));
        }
        let (best, _) = count
            .iter()
            .enumerate()
            .max_by_key(|(_, val)| **val)
            .unwrap_or((0, &0));
        if best != 0 {
            consensus.push(SLOTS[best]);
        }
        if matched[pos] == seqs.len() && !near_insert[pos] {
            matches += 1;
        }
    }
    let last = backbone.len();
    if inserts[last].len() > seqs.len() / 2 {
        consensus.extend_from_slice(get_ins_consensus(&mut inserts[last], seqs.len()));
    }

    MultiAlignment { matches, consensus }
}

/// Most frequent insertion at one backbone position, provided more
/// sequences carry it than carry no insertion at all.
fn get_ins_consensus(ins_by_seq: &mut [Sequence], num_seqs: usize) -> &[u8] {
    ins_by_seq.sort();
    let seqs_without_ins = num_seqs - ins_by_seq.len();
    let top = ins_by_seq
        .iter()
        .chunk_by(|ins| *ins)
        .into_iter()
        .map(|(ins, group)| (ins, group.count()))
        .sorted_by(|a, b| Ord::cmp(&b.1, &a.1))
        .next();

    match top {
        Some((ins, count)) if count > seqs_without_ins => ins.as_slice(),
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_alignment_marks_mismatch_with_iupac_code() {
        let result = GlobalAligner.align(b"ACGTACGTAC", b"ACGTTCGTAC");
        assert_eq!(result.matches, 9);
        assert_eq!(result.length, 10);
        assert_eq!(result.consensus, b"ACGTWCGTAC".to_vec());
    }

    #[test]
    fn global_alignment_lowercases_gaps() {
        let result = GlobalAligner.align(b"ACGTTACGT", b"ACGTACGT");
        assert_eq!(result.matches, 8);
        assert_eq!(result.length, 9);
        assert_eq!(result.consensus.to_ascii_uppercase(), b"ACGTTACGT".to_vec());
        assert_eq!(
            result
                .consensus
                .iter()
                .filter(|b| b.is_ascii_lowercase())
                .count(),
            1
        );
    }

    #[test]
    fn global_alignment_ignores_case() {
        let result = GlobalAligner.align(b"acgt", b"ACGN");
        assert_eq!(result.matches, 3);
        assert_eq!(result.consensus, b"acgt".to_vec());
    }

    #[test]
    fn star_alignment_of_identical_sequences() {
        let seqs = vec![b"ACGTACGT".to_vec(); 3];
        let result = StarAligner.align(&seqs);
        assert_eq!(result.matches, 8);
        assert_eq!(result.consensus, b"ACGTACGT".to_vec());
    }

    #[test]
    fn star_alignment_votes_on_substitutions() {
        let seqs = vec![
            b"ACGTACGT".to_vec(),
            b"acgtacgt".to_vec(),
            b"ACGAACGT".to_vec(),
        ];
        let result = StarAligner.align(&seqs);
        assert_eq!(result.matches, 7);
        assert_eq!(result.consensus, b"ACGTACGT".to_vec());
    }

    #[test]
    fn star_alignment_keeps_majority_bases() {
        let seqs = vec![
            b"ACGTTACGT".to_vec(),
            b"ACGTTACGT".to_vec(),
            b"ACGTACGT".to_vec(),
        ];
        let result = StarAligner.align(&seqs);
        assert_eq!(result.matches, 8);
        assert_eq!(result.consensus, b"ACGTTACGT".to_vec());
    }

    #[test]
    fn insertion_consensus_needs_majority() {
        let mut inserts = vec![b"GG".to_vec(), b"GG".to_vec(), b"T".to_vec()];
        assert_eq!(get_ins_consensus(&mut inserts, 4), b"GG");
        let mut inserts = vec![b"GG".to_vec(), b"T".to_vec()];
        assert_eq!(get_ins_consensus(&mut inserts, 3), b"");
    }
}
