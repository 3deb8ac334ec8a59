use super::{read_dot, ContigDictionary, ContigGraph, ContigId, ContigNode, DotGraph};
use crate::utils::{open_reader, Result};
use bio::{alphabets::dna::revcomp, io::fasta};
use std::{io, path::Path};

pub type Sequence = Vec<u8>;

/// The contig graph together with the contig names and sequences.
#[derive(Debug)]
pub struct Assembly {
    pub k: u32,
    pub dict: ContigDictionary,
    pub graph: ContigGraph,
    sequences: Vec<Sequence>,
}

impl Assembly {
    pub fn load(graph_path: &Path, contigs_path: &Path, k: u32) -> Result<Self> {
        log::info!("Reading `{}`", graph_path.display());
        let dot = read_dot(open_reader(graph_path)?, k)
            .map_err(|e| format!("{}: {}", graph_path.display(), e))?;
        log::info!(
            "Read {} contigs and {} edges",
            dot.graph.num_contigs(),
            dot.graph.num_edges()
        );

        log::info!("Reading `{}`", contigs_path.display());
        Self::from_parts(dot, open_reader(contigs_path)?, k)
            .map_err(|e| format!("{}: {}", contigs_path.display(), e))
    }

    /// Pairs every vertex of `dot` with its FASTA record. Each vertex must
    /// have exactly one record whose length matches the vertex length.
    pub fn from_parts<R: io::Read>(dot: DotGraph, contigs: R, k: u32) -> Result<Self> {
        if let Some(graph_k) = dot.k {
            if graph_k != k {
                return Err(format!(
                    "The graph was built with k={} but k={} was given",
                    graph_k, k
                ));
            }
        }

        let mut sequences: Vec<Option<Sequence>> = vec![None; dot.graph.num_contigs()];
        for record in fasta::Reader::new(contigs).records() {
            let record = record.map_err(|e| format!("Failed to parse contig FASTA: {}", e))?;
            let id = dot.dict.get(record.id()).ok_or_else(|| {
                format!("Contig '{}' is not a vertex of the graph", record.id())
            })?;
            let length = dot.graph.props(id).length as usize;
            if record.seq().len() != length {
                return Err(format!(
                    "Contig '{}' has {} bases but its graph vertex has length {}",
                    record.id(),
                    record.seq().len(),
                    length
                ));
            }
            let slot = &mut sequences[id.index()];
            if slot.is_some() {
                return Err(format!("Duplicate contig '{}'", record.id()));
            }
            *slot = Some(record.seq().to_vec());
        }

        let sequences = sequences
            .into_iter()
            .enumerate()
            .map(|(index, seq)| {
                seq.ok_or_else(|| {
                    format!(
                        "Contig '{}' of the graph has no sequence",
                        dot.dict.name(ContigId(index as u32))
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if sequences.is_empty() {
            return Err("No contigs found".to_string());
        }

        Ok(Assembly {
            k,
            dict: dot.dict,
            graph: dot.graph,
            sequences,
        })
    }

    #[cfg(test)]
    pub fn from_strings(dot: &str, contigs: &str, k: u32) -> Self {
        let dot = read_dot(io::Cursor::new(dot), k).unwrap();
        Self::from_parts(dot, contigs.as_bytes(), k).unwrap()
    }

    /// Number of contigs read from the input, excluding synthesized ones.
    pub fn num_input_contigs(&self) -> usize {
        self.sequences.len()
    }

    /// Sequence of `node` as read on its strand. A gap of n bases reads as
    /// k-1 plus n `N`s, lowercase when the gap is shorter than k.
    pub fn sequence(&self, node: ContigNode) -> Sequence {
        match node {
            ContigNode::Contig { id, reverse } => {
                let seq = &self.sequences[id.index()];
                if reverse {
                    revcomp(seq)
                } else {
                    seq.clone()
                }
            }
            ContigNode::Gap { len } => {
                let base = if len < self.k { b'n' } else { b'N' };
                let mut seq = vec![b'N'; self.k as usize - 1];
                seq.extend(std::iter::repeat(base).take(len as usize));
                seq
            }
        }
    }

    pub fn format_path(&self, path: &[ContigNode]) -> String {
        self.dict.format_path(path)
    }
}
