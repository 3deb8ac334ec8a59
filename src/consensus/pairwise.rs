use super::{length_ratio, merge_path, ConsensusBuilder, ContigDraft, GapConsensus};
use crate::graph::{ContigNode, ContigPath};
use crate::utils::Result;

/// Nodes strictly between the two endpoints.
fn interior(path: &[ContigNode]) -> &[ContigNode] {
    if path.len() < 2 {
        &[]
    } else {
        &path[1..path.len() - 1]
    }
}

impl ConsensusBuilder<'_> {
    pub(super) fn align_pair(&self, first: &ContigPath, second: &ContigPath) -> Result<GapConsensus> {
        let interiors = [interior(first), interior(second)];
        let seqs = [
            merge_path(self.asm, interiors[0])?,
            merge_path(self.asm, interiors[1])?,
        ];

        match (interiors[0].is_empty(), interiors[1].is_empty()) {
            (true, true) => return Ok(GapConsensus::Existing(first.clone())),
            (true, false) => return Ok(self.align_deletion(interiors[1], &seqs[1])),
            (false, true) => return Ok(self.align_deletion(interiors[0], &seqs[0])),
            (false, false) => {}
        }

        if seqs[0] == seqs[1] {
            if interiors[0].len() == interiors[1].len() {
                self.verify_palindrome(interiors[0], interiors[1])?;
                log::debug!(
                    "Palindrome: {} and {}",
                    self.asm.format_path(first),
                    self.asm.format_path(second)
                );
                return Ok(GapConsensus::Existing(first.clone()));
            }
            log::warn!(
                "Two paths have identical sequence, which may be caused by a transitive edge in the overlap graph.\n{}\n{}",
                self.asm.format_path(first),
                self.asm.format_path(second)
            );
            let longer = if first.len() > second.len() {
                first
            } else {
                second
            };
            return Ok(GapConsensus::Existing(longer.clone()));
        }

        let ratio = length_ratio(&seqs);
        if ratio < self.identity {
            log::debug!(
                "Length ratio {:.3} below identity threshold: {} and {}",
                ratio,
                self.asm.format_path(first),
                self.asm.format_path(second)
            );
            return Ok(GapConsensus::Dissimilar { identity: ratio });
        }

        let alignment = self.pairwise.align(&seqs[0], &seqs[1]);
        let identity = if alignment.length == 0 {
            0.0
        } else {
            alignment.matches as f32 / alignment.length as f32
        };
        log::debug!(
            "Pairwise identity {:.3} ({}/{}): {} and {}",
            identity,
            alignment.matches,
            alignment.length,
            self.asm.format_path(first),
            self.asm.format_path(second)
        );
        if identity < self.identity {
            return Ok(GapConsensus::Dissimilar { identity });
        }

        Ok(GapConsensus::NewContig(ContigDraft {
            prefix_len: 1,
            suffix_len: 1,
            sequence: alignment.consensus,
            coverage: self.asm.graph.path_coverage(interiors[0])
                + self.asm.graph.path_coverage(interiors[1]),
        }))
    }

    /// One candidate joins the endpoints directly. The other candidate's
    /// sequence becomes the consensus, masked past its first k-1 bases.
    fn align_deletion(&self, path: &[ContigNode], seq: &[u8]) -> GapConsensus {
        let unmasked = (self.asm.k as usize - 1).min(seq.len());
        let mut consensus = seq.to_vec();
        consensus[unmasked..].make_ascii_lowercase();
        let identity = if consensus.is_empty() {
            0.0
        } else {
            unmasked as f32 / consensus.len() as f32
        };
        log::debug!(
            "Deletion identity {:.3}: {}",
            identity,
            self.asm.format_path(path)
        );
        if identity < self.identity {
            return GapConsensus::Dissimilar { identity };
        }
        GapConsensus::NewContig(ContigDraft {
            prefix_len: 1,
            suffix_len: 1,
            sequence: consensus,
            coverage: self.asm.graph.path_coverage(path),
        })
    }

    /// Two paths with the same sequence and node count must differ only
    /// by the orientation of one palindromic contig.
    fn verify_palindrome(&self, a: &[ContigNode], b: &[ContigNode]) -> Result<()> {
        let Some(pos) = a.iter().zip(b).position(|(x, y)| x != y) else {
            return Ok(());
        };
        if a[pos].complement() == b[pos] && a[pos + 1..] == b[pos + 1..] {
            Ok(())
        } else {
            Err(format!(
                "Paths with identical sequence are not palindromic: {} and {}",
                self.asm.format_path(a),
                self.asm.format_path(b)
            ))
        }
    }
}
