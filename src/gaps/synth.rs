use crate::consensus::ContigDraft;
use crate::graph::{
    ContigDictionary, ContigGraph, ContigId, ContigIdAllocator, ContigNode, ContigPath,
    ContigProps,
};
use crate::utils::Result;
use bio::io::fasta;
use std::io::Write;

/// A consensus contig to be added to the graph between `pred` and `succ`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContigRecord {
    pub id: ContigId,
    pub props: ContigProps,
    pub pred: ContigNode,
    pub succ: ContigNode,
}

/// New contigs recorded while gaps are resolved. The graph must not
/// change during the search, so they are added in one pass at the end.
#[derive(Debug, Default)]
pub struct PendingGraphEdits {
    records: Vec<NewContigRecord>,
}

impl PendingGraphEdits {
    pub fn push(&mut self, record: NewContigRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NewContigRecord] {
        &self.records
    }

    /// Adds every new contig with edges `pred -> new -> succ` of
    /// distance -(k-1).
    pub fn apply(self, graph: &mut ContigGraph, k: u32) -> Result<()> {
        let distance = -(k as i32 - 1);
        for record in self.records {
            let id = graph.add_vertex(record.props);
            if id != record.id {
                return Err(format!(
                    "New contig was allocated id {} but the graph assigned {}",
                    record.id.0, id.0
                ));
            }
            let node = ContigNode::forward(id);
            graph.add_edge(record.pred, node, distance)?;
            graph.add_edge(node, record.succ, distance)?;
        }
        Ok(())
    }
}

/// Mints consensus contigs: allocates their ids, writes their sequences
/// and records the graph edits that connect them.
pub struct ContigSynthesizer<W: Write> {
    allocator: ContigIdAllocator,
    writer: fasta::Writer<W>,
    pending: PendingGraphEdits,
}

impl<W: Write> ContigSynthesizer<W> {
    pub fn new(allocator: ContigIdAllocator, writer: W) -> Self {
        Self {
            allocator,
            writer: fasta::Writer::new(writer),
            pending: PendingGraphEdits::default(),
        }
    }

    /// Creates a contig from `draft` and returns the path it resolves:
    /// the shared prefix, the new contig, then the shared suffix.
    pub fn synthesize(
        &mut self,
        dict: &mut ContigDictionary,
        solutions: &[ContigPath],
        draft: &ContigDraft,
    ) -> Result<ContigPath> {
        let first = solutions
            .first()
            .ok_or("Cannot synthesize a contig without candidate paths")?;
        let (prefix, suffix) = (draft.prefix_len, draft.suffix_len);
        if prefix == 0 || suffix == 0 || prefix + suffix > first.len() {
            return Err(format!(
                "Invalid shared prefix {} and suffix {} for a path of {} nodes",
                prefix,
                suffix,
                first.len()
            ));
        }

        let id = self.allocator.allocate(dict);
        let node = ContigNode::forward(id);
        let pred = first[prefix - 1];
        let succ = first[first.len() - suffix];
        let props = ContigProps {
            length: draft.sequence.len() as u32,
            coverage: draft.coverage,
        };

        let provenance = solutions
            .iter()
            .map(|path| {
                let core = &path[prefix..path.len() - suffix];
                if core.is_empty() {
                    "*".to_string()
                } else {
                    core.iter()
                        .map(|&n| dict.node(n).to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                }
            })
            .collect::<Vec<_>>()
            .join(";");
        let desc = format!("{} {} {}", props.length, props.coverage, provenance);
        self.writer
            .write(dict.name(id), Some(desc.as_str()), &draft.sequence)
            .map_err(|e| format!("Failed to write contig {}: {}", dict.name(id), e))?;
        log::trace!("New contig {}: {}", dict.name(id), desc);

        self.pending.push(NewContigRecord {
            id,
            props,
            pred,
            succ,
        });

        let mut path = first[..prefix].to_vec();
        path.push(node);
        path.extend_from_slice(&first[first.len() - suffix..]);
        Ok(path)
    }

    pub fn finish(mut self) -> Result<PendingGraphEdits> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to write contigs: {}", e))?;
        Ok(self.pending)
    }
}
