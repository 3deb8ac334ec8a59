use super::{length_ratio, merge_path, ConsensusBuilder, ContigDraft, GapConsensus};
use crate::graph::{ContigNode, ContigPath, Sequence};
use crate::utils::Result;

/// Lengths of the longest node prefix and suffix shared by all paths.
/// The two never overlap within the shortest path.
pub fn common_prefix_suffix(paths: &[ContigPath]) -> (usize, usize) {
    let Some(first) = paths.first() else {
        return (0, 0);
    };
    let min_len = paths.iter().map(|p| p.len()).min().unwrap_or(0);
    let prefix = (0..min_len)
        .take_while(|&i| paths.iter().all(|p| p[i] == first[i]))
        .count();
    let suffix = (0..min_len - prefix)
        .take_while(|&i| {
            let node = first[first.len() - 1 - i];
            paths.iter().all(|p| p[p.len() - 1 - i] == node)
        })
        .count();
    (prefix, suffix)
}

impl ConsensusBuilder<'_> {
    pub(super) fn align_multi(&self, solutions: &[ContigPath]) -> Result<GapConsensus> {
        let (prefix, suffix) = common_prefix_suffix(solutions);
        if prefix == 0 || suffix == 0 {
            return Err(format!(
                "Candidate paths do not share their endpoints: {}",
                self.format_paths(solutions)
            ));
        }

        let mut coverage = 0;
        let mut seqs: Vec<Sequence> = Vec::with_capacity(solutions.len());
        for path in solutions {
            let core = &path[prefix..path.len() - suffix];
            if core.is_empty() {
                let last_shared = self.asm.sequence(solutions[0][prefix - 1]);
                let overlap = (self.asm.k as usize - 1).min(last_shared.len());
                seqs.push(last_shared[last_shared.len() - overlap..].to_vec());
            } else {
                seqs.push(merge_path(self.asm, core)?);
                coverage += self.asm.graph.path_coverage(core);
            }
        }
        log::trace!(
            "Aligning {} cores after {} shared and before {} shared nodes",
            seqs.len(),
            prefix,
            suffix
        );

        let ratio = length_ratio(&seqs);
        if ratio < self.identity {
            log::debug!(
                "Length ratio {:.3} below identity threshold: {}",
                ratio,
                self.format_paths(solutions)
            );
            return Ok(GapConsensus::Dissimilar { identity: ratio });
        }

        let alignment = self.multi.align(&seqs);
        let identity = if alignment.consensus.is_empty() {
            0.0
        } else {
            alignment.matches as f32 / alignment.consensus.len() as f32
        };
        log::debug!(
            "Multiple alignment identity {:.3} ({}/{}) over {} paths",
            identity,
            alignment.matches,
            alignment.consensus.len(),
            solutions.len()
        );
        if identity < self.identity {
            return Ok(GapConsensus::Dissimilar { identity });
        }

        if alignment.matches == alignment.consensus.len() {
            self.verify_palindromes(solutions, prefix, suffix)?;
            log::debug!("Palindromes: {}", self.format_paths(solutions));
            return Ok(GapConsensus::Existing(solutions[0].clone()));
        }

        Ok(GapConsensus::NewContig(ContigDraft {
            prefix_len: prefix,
            suffix_len: suffix,
            sequence: alignment.consensus,
            coverage,
        }))
    }

    /// Paths that align perfectly must differ only by the orientation of
    /// the palindromic contigs bordering the shared prefix and suffix.
    fn verify_palindromes(&self, solutions: &[ContigPath], prefix: usize, suffix: usize) -> Result<()> {
        let first = &solutions[0];
        let len = first.len();
        let err = || {
            format!(
                "Perfectly aligned paths are not palindromic: {}",
                self.format_paths(solutions)
            )
        };
        if len < prefix + suffix + 1 {
            return Err(err());
        }
        let (p0, p1) = (first[prefix], first[len - 1 - suffix]);
        if !self.is_palindrome(p0) || !self.is_palindrome(p1) {
            return Err(err());
        }
        let same_contigs = solutions.iter().all(|path| {
            path.len() == len
                && path[prefix].contig_id() == p0.contig_id()
                && path[len - 1 - suffix].contig_id() == p1.contig_id()
        });
        if same_contigs {
            Ok(())
        } else {
            Err(err())
        }
    }

    fn is_palindrome(&self, node: ContigNode) -> bool {
        !node.is_gap() && self.asm.sequence(node) == self.asm.sequence(node.complement())
    }

    fn format_paths(&self, paths: &[ContigPath]) -> String {
        paths
            .iter()
            .map(|p| self.asm.format_path(p))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{mock::CountingAligner, GlobalAligner, StarAligner};
    use crate::graph::{Assembly, ContigId};

    const DOT: &str = r#"digraph adj {
"S+" [l=5 C=1]
"T+" [l=5 C=1]
"a+" [l=5 C=1]
"b+" [l=5 C=10]
"c+" [l=5 C=20]
"d+" [l=8 C=40]
"X+" [l=5 C=100]
"p+" [l=4 C=3]
"q+" [l=4 C=3]
"b+" -> "X+" [d=-2]
"c+" -> "X+" [d=-2]
"p+" -> "q+" [d=-2]
"p-" -> "q+" [d=-2]
"p-" -> "q-" [d=-2]
}
"#;

    const FASTA: &str = ">S\nAAAAC\n>T\nGGGGA\n>a\nCCCAG\n>b\nTTACG\n>c\nTTCCG\n>d\nTTACGTAT\n\
>X\nCGAAT\n>p\nACGT\n>q\nGTAC\n";

    fn asm() -> Assembly {
        Assembly::from_strings(DOT, FASTA, 3)
    }

    fn path(asm: &Assembly, tokens: &str) -> ContigPath {
        tokens
            .split_whitespace()
            .map(|t| asm.dict.parse_node(t).unwrap())
            .collect()
    }

    fn node(i: u32) -> ContigNode {
        ContigNode::forward(ContigId(i))
    }

    #[test]
    fn prefix_and_suffix_are_factored_out() {
        let (s, a, b, c, d, x, t) = (node(0), node(1), node(2), node(3), node(4), node(5), node(6));
        let paths = vec![
            vec![s, a, b, x, t],
            vec![s, a, c, x, t],
            vec![s, a, d, t],
        ];
        assert_eq!(common_prefix_suffix(&paths), (2, 1));
    }

    #[test]
    fn prefix_and_suffix_never_overlap() {
        let (s, a, t) = (node(0), node(1), node(2));
        let paths = vec![vec![s, t], vec![s, a, t], vec![s, a, a, t]];
        assert_eq!(common_prefix_suffix(&paths), (1, 1));
        assert_eq!(common_prefix_suffix(&[]), (0, 0));
    }

    #[test]
    fn divergent_cores_are_aligned() {
        let asm = asm();
        let mock = CountingAligner::new(6, b"TTACGAAT");
        let builder = ConsensusBuilder::new(&asm, 0.7, &GlobalAligner, &mock);
        let solutions = [
            path(&asm, "S+ a+ b+ X+ T+"),
            path(&asm, "S+ a+ c+ X+ T+"),
            path(&asm, "S+ a+ d+ T+"),
        ];
        assert_eq!(
            builder.align(&solutions).unwrap(),
            GapConsensus::NewContig(ContigDraft {
                prefix_len: 2,
                suffix_len: 1,
                sequence: b"TTACGAAT".to_vec(),
                coverage: 110 + 120 + 40,
            })
        );
        assert_eq!(mock.calls(), 1);
        assert_eq!(
            *mock.seen.lock().unwrap(),
            vec![
                b"TTACGAAT".to_vec(),
                b"TTCCGAAT".to_vec(),
                b"TTACGTAT".to_vec()
            ]
        );
    }

    #[test]
    fn empty_core_uses_last_shared_kmer() {
        let asm = asm();
        let mock = CountingAligner::new(0, b"AG");
        let builder = ConsensusBuilder::new(&asm, 0.0, &GlobalAligner, &mock);
        let solutions = [
            path(&asm, "S+ a+ T+"),
            path(&asm, "S+ b+ T+"),
            path(&asm, "S+ T+"),
        ];
        builder.align(&solutions).unwrap();
        assert_eq!(mock.seen.lock().unwrap()[2], b"AC".to_vec());
    }

    #[test]
    fn dissimilar_lengths_skip_alignment() {
        let asm = asm();
        let mock = CountingAligner::new(0, b"");
        let builder = ConsensusBuilder::new(&asm, 0.9, &GlobalAligner, &mock);
        let solutions = [
            path(&asm, "S+ a+ T+"),
            path(&asm, "S+ b+ T+"),
            path(&asm, "S+ d+ T+"),
        ];
        assert_eq!(
            builder.align(&solutions).unwrap(),
            GapConsensus::Dissimilar { identity: 0.625 }
        );
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn perfect_alignment_of_palindromes() {
        let asm = asm();
        let builder = ConsensusBuilder::new(&asm, 0.9, &GlobalAligner, &StarAligner);
        let solutions = [
            path(&asm, "S+ p+ q+ T+"),
            path(&asm, "S+ p- q+ T+"),
            path(&asm, "S+ p- q- T+"),
        ];
        assert_eq!(
            builder.align(&solutions).unwrap(),
            GapConsensus::Existing(solutions[0].clone())
        );
    }

    #[test]
    fn perfect_alignment_without_palindromes_err() {
        let asm = asm();
        let mock = CountingAligner::new(4, b"ACGT");
        let builder = ConsensusBuilder::new(&asm, 0.9, &GlobalAligner, &mock);
        let solutions = [
            path(&asm, "S+ a+ T+"),
            path(&asm, "S+ b+ T+"),
            path(&asm, "S+ c+ T+"),
        ];
        assert!(builder.align(&solutions).is_err());
    }
}
