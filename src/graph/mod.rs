mod assembly;
mod dot;
mod node;
mod search;

pub use assembly::{Assembly, Sequence};
pub use dot::{read_dot, write_dot, DotGraph};
pub use node::{ContigDictionary, ContigId, ContigIdAllocator, ContigNode, ContigPath};
pub use search::{constrained_search, SearchResult};

use crate::utils::Result;

/// Length and coverage of a contig vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContigProps {
    pub length: u32,
    /// Total k-mer count of the contig.
    pub coverage: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub target: ContigNode,
    /// Signed distance between the two contigs; negative values are overlaps.
    pub distance: i32,
}

/// Bidirected contig adjacency graph. Every contig contributes two
/// vertices, one per strand, and every edge `u -> v` is mirrored by
/// `~v -> ~u`.
#[derive(Debug, Default, Clone)]
pub struct ContigGraph {
    props: Vec<ContigProps>,
    out_edges: Vec<Vec<Edge>>,
}

impl ContigGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_contigs(&self) -> usize {
        self.props.len()
    }

    pub fn num_edges(&self) -> usize {
        self.out_edges.iter().map(|edges| edges.len()).sum()
    }

    /// Appends a contig and returns its id.
    pub fn add_vertex(&mut self, props: ContigProps) -> ContigId {
        let id = ContigId(self.props.len() as u32);
        self.props.push(props);
        self.out_edges.push(Vec::new());
        self.out_edges.push(Vec::new());
        id
    }

    pub fn props(&self, id: ContigId) -> ContigProps {
        self.props[id.index()]
    }

    /// Adds `u -> v` and its mirror `~v -> ~u`. Re-adding an existing
    /// edge keeps the first distance.
    pub fn add_edge(&mut self, u: ContigNode, v: ContigNode, distance: i32) -> Result<()> {
        self.insert_edge(u, v, distance)?;
        self.insert_edge(v.complement(), u.complement(), distance)
    }

    fn insert_edge(&mut self, u: ContigNode, v: ContigNode, distance: i32) -> Result<()> {
        let (Some(ui), Some(vi)) = (u.vertex_index(), v.vertex_index()) else {
            return Err("Gaps cannot be graph vertices".to_string());
        };
        if ui >= self.out_edges.len() || vi >= self.out_edges.len() {
            return Err(format!(
                "Edge endpoint out of range: {:?} -> {:?} in a graph of {} contigs",
                u,
                v,
                self.num_contigs()
            ));
        }
        let edges = &mut self.out_edges[ui];
        if !edges.iter().any(|e| e.target == v) {
            edges.push(Edge {
                target: v,
                distance,
            });
        }
        Ok(())
    }

    pub fn out_edges(&self, u: ContigNode) -> &[Edge] {
        u.vertex_index()
            .and_then(|i| self.out_edges.get(i))
            .map(|edges| edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn edge_distance(&self, u: ContigNode, v: ContigNode) -> Option<i32> {
        self.out_edges(u)
            .iter()
            .find(|e| e.target == v)
            .map(|e| e.distance)
    }

    /// Sum of the coverage of the contigs of `path`.
    pub fn path_coverage(&self, path: &[ContigNode]) -> u64 {
        path.iter()
            .filter_map(|node| node.contig_id())
            .map(|id| self.props(id).coverage)
            .sum()
    }
}
