use super::GapConstraint;
use crate::consensus::{ConsensusBuilder, GapConsensus, MultiAligner, PairwiseAligner};
use crate::graph::{constrained_search, Assembly, ContigPath};
use crate::utils::Result;
use std::fmt;

#[derive(Debug, Clone, Copy)]
pub struct ResolverParams {
    /// Slack allowed beyond the estimated gap size.
    pub dist_error: u32,
    /// Most candidate paths a gap may have and still be aligned.
    pub max_branches: usize,
    /// Visitation budget of the constrained search.
    pub max_cost: usize,
    /// Minimum identity for candidates to be merged.
    pub identity: f32,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            dist_error: 6,
            max_branches: 4,
            max_cost: 100_000,
            identity: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GapOutcome {
    /// The search exhausted its budget; any candidates found are ignored.
    TooComplex { visited: usize },
    TooManyPaths(usize),
    NoPaths,
    SinglePath(ContigPath),
    Consensus {
        solutions: Vec<ContigPath>,
        consensus: GapConsensus,
    },
    Dissimilar { identity: f32 },
}

pub struct GapResolver<'a> {
    asm: &'a Assembly,
    params: ResolverParams,
    builder: ConsensusBuilder<'a>,
}

impl<'a> GapResolver<'a> {
    pub fn new(
        asm: &'a Assembly,
        params: ResolverParams,
        pairwise: &'a dyn PairwiseAligner,
        multi: &'a dyn MultiAligner,
    ) -> Self {
        Self {
            asm,
            params,
            builder: ConsensusBuilder::new(asm, params.identity, pairwise, multi),
        }
    }

    /// Searches the candidate paths filling `gap` and classifies them.
    /// Every candidate starts with the gap's source.
    pub fn resolve_gap(&self, gap: &GapConstraint) -> Result<GapOutcome> {
        log::trace!(
            "Resolving {} {}N {}",
            self.asm.dict.node(gap.source),
            gap.distance,
            self.asm.dict.node(gap.dest)
        );
        let max_distance = gap.distance.saturating_add(self.params.dist_error as i32);
        let result = constrained_search(
            &self.asm.graph,
            gap.source,
            gap.dest,
            max_distance,
            self.params.max_cost,
        );
        if result.visited >= self.params.max_cost {
            log::debug!("{} paths (too complex)", result.paths.len());
            return Ok(GapOutcome::TooComplex {
                visited: result.visited,
            });
        }

        let mut solutions: Vec<ContigPath> = result
            .paths
            .into_iter()
            .map(|path| {
                let mut full = Vec::with_capacity(path.len() + 1);
                full.push(gap.source);
                full.extend(path);
                full
            })
            .collect();

        if solutions.len() > self.params.max_branches {
            log::debug!("{} paths (too many)", solutions.len());
            return Ok(GapOutcome::TooManyPaths(solutions.len()));
        }
        match solutions.len() {
            0 => {
                log::debug!("No paths");
                Ok(GapOutcome::NoPaths)
            }
            1 => {
                let path = solutions.remove(0);
                log::debug!("1 path: {}", self.asm.format_path(&path));
                Ok(GapOutcome::SinglePath(path))
            }
            n => {
                log::debug!("{} paths", n);
                for path in &solutions {
                    log::trace!("{}", self.asm.format_path(path));
                }
                match self.builder.align(&solutions)? {
                    GapConsensus::Dissimilar { identity } => Ok(GapOutcome::Dissimilar { identity }),
                    consensus => Ok(GapOutcome::Consensus {
                        solutions,
                        consensus,
                    }),
                }
            }
        }
    }
}

/// Counts of gap outcomes over a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GapStats {
    pub ambiguous: usize,
    pub merged: usize,
    pub no_paths: usize,
    pub too_many: usize,
    pub too_complex: usize,
    pub dissimilar: usize,
}

impl GapStats {
    pub fn record(&mut self, outcome: &GapOutcome) {
        match outcome {
            GapOutcome::TooComplex { .. } => self.too_complex += 1,
            GapOutcome::TooManyPaths(_) => self.too_many += 1,
            GapOutcome::NoPaths => self.no_paths += 1,
            GapOutcome::SinglePath(_) | GapOutcome::Consensus { .. } => self.merged += 1,
            GapOutcome::Dissimilar { .. } => self.dissimilar += 1,
        }
    }
}

impl fmt::Display for GapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ambiguous paths: {}", self.ambiguous)?;
        writeln!(f, "Merged:          {}", self.merged)?;
        writeln!(f, "No paths:        {}", self.no_paths)?;
        writeln!(f, "Too many paths:  {}", self.too_many)?;
        writeln!(f, "Too complex:     {}", self.too_complex)?;
        write!(f, "Dissimilar:      {}", self.dissimilar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{mock::CountingAligner, ContigDraft};

    // S -> a -> T, S -> b -> T, S -> c -> T
    const DOT: &str = r#"digraph adj {
graph [k=3]
"S+" [l=5 C=1]
"T+" [l=5 C=1]
"a+" [l=6 C=10]
"b+" [l=6 C=20]
"c+" [l=7 C=30]
"S+" -> "a+"
"a+" -> "T+"
"S+" -> "b+"
"b+" -> "T+"
"S+" -> "c+"
"c+" -> "T+"
}
"#;

    const FASTA: &str = ">S\nAAAAC\n>T\nGGGGA\n>a\nACGTAC\n>b\nACGAAC\n>c\nACGTTAC\n";

    fn asm() -> Assembly {
        Assembly::from_strings(DOT, FASTA, 3)
    }

    fn gap(asm: &Assembly, source: &str, dest: &str, distance: i32) -> GapConstraint {
        GapConstraint {
            source: asm.dict.parse_node(source).unwrap(),
            dest: asm.dict.parse_node(dest).unwrap(),
            distance,
        }
    }

    fn params(max_branches: usize, max_cost: usize) -> ResolverParams {
        ResolverParams {
            dist_error: 0,
            max_branches,
            max_cost,
            identity: 0.5,
        }
    }

    #[test]
    fn single_candidate_needs_no_alignment() {
        let asm = asm();
        let mock = CountingAligner::new(0, b"");
        let resolver = GapResolver::new(&asm, params(4, 1000), &mock, &mock);
        // S a T and S b T span -2 + 6 - 2 = 2 bases
        let outcome = resolver.resolve_gap(&gap(&asm, "S+", "T+", 0)).unwrap();
        assert_eq!(outcome, GapOutcome::NoPaths);

        let outcome = resolver.resolve_gap(&gap(&asm, "S+", "a+", 0)).unwrap();
        let expected = vec![
            asm.dict.parse_node("S+").unwrap(),
            asm.dict.parse_node("a+").unwrap(),
        ];
        assert_eq!(outcome, GapOutcome::SinglePath(expected));
        assert_eq!(mock.calls(), 0);

        let mut stats = GapStats::default();
        stats.record(&outcome);
        assert_eq!(stats.merged, 1);
    }

    #[test]
    fn candidates_are_aligned() {
        let asm = asm();
        let mock = CountingAligner::new(5, b"ACGWAC");
        let resolver = GapResolver::new(&asm, params(2, 1000), &mock, &mock);
        let outcome = resolver.resolve_gap(&gap(&asm, "S+", "T+", 2)).unwrap();
        let (solutions, consensus) = match outcome {
            GapOutcome::Consensus {
                solutions,
                consensus,
            } => (solutions, consensus),
            other => panic!("Expected a consensus, got {:?}", other),
        };
        assert_eq!(solutions.len(), 2);
        assert!(solutions.iter().all(|p| p.len() == 3));
        assert_eq!(
            consensus,
            GapConsensus::NewContig(ContigDraft {
                prefix_len: 1,
                suffix_len: 1,
                sequence: b"ACGWAC".to_vec(),
                coverage: 30,
            })
        );
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn branching_limit() {
        let asm = asm();
        let mock = CountingAligner::new(0, b"");
        let resolver = GapResolver::new(&asm, params(2, 1000), &mock, &mock);
        let outcome = resolver.resolve_gap(&gap(&asm, "S+", "T+", 3)).unwrap();
        assert_eq!(outcome, GapOutcome::TooManyPaths(3));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn exhausted_budget_discards_candidates() {
        let asm = asm();
        let mock = CountingAligner::new(0, b"");
        let resolver = GapResolver::new(&asm, params(4, 3), &mock, &mock);
        let outcome = resolver.resolve_gap(&gap(&asm, "S+", "T+", 3)).unwrap();
        assert_eq!(outcome, GapOutcome::TooComplex { visited: 3 });
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn dissimilar_candidates() {
        let asm = asm();
        let mock = CountingAligner::new(1, b"ACGTAC");
        let resolver = GapResolver::new(&asm, params(2, 1000), &mock, &mock);
        let outcome = resolver.resolve_gap(&gap(&asm, "S+", "T+", 2)).unwrap();
        let mut stats = GapStats::default();
        stats.record(&outcome);
        assert_eq!(stats.dissimilar, 1);
    }

    #[test]
    fn stats_summary() {
        let stats = GapStats {
            ambiguous: 5,
            merged: 2,
            no_paths: 1,
            too_many: 1,
            too_complex: 1,
            dissimilar: 0,
        };
        let text = stats.to_string();
        assert!(text.starts_with("Ambiguous paths: 5\nMerged:          2\n"));
        assert!(text.ends_with("Dissimilar:      0"));
    }
}
