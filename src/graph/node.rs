use crate::utils::Result;
use std::{
    collections::{HashMap, HashSet},
    fmt,
};

/// Dense index of a contig in the dictionary and the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContigId(pub u32);

impl ContigId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An oriented contig or a run of unknown bases in a scaffold path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContigNode {
    Contig { id: ContigId, reverse: bool },
    Gap { len: u32 },
}

impl ContigNode {
    pub fn forward(id: ContigId) -> Self {
        ContigNode::Contig { id, reverse: false }
    }

    pub fn reverse(id: ContigId) -> Self {
        ContigNode::Contig { id, reverse: true }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, ContigNode::Gap { .. })
    }

    pub fn contig_id(&self) -> Option<ContigId> {
        match self {
            ContigNode::Contig { id, .. } => Some(*id),
            ContigNode::Gap { .. } => None,
        }
    }

    /// The same contig read from the other strand. Gaps have no strand.
    pub fn complement(self) -> Self {
        match self {
            ContigNode::Contig { id, reverse } => ContigNode::Contig {
                id,
                reverse: !reverse,
            },
            gap => gap,
        }
    }

    /// Index of this oriented contig among the 2n graph vertices.
    pub(crate) fn vertex_index(self) -> Option<usize> {
        match self {
            ContigNode::Contig { id, reverse } => Some(2 * id.index() + reverse as usize),
            ContigNode::Gap { .. } => None,
        }
    }
}

pub type ContigPath = Vec<ContigNode>;

/// Maps contig names to dense ids and back.
#[derive(Debug, Default, Clone)]
pub struct ContigDictionary {
    names: Vec<String>,
    index: HashMap<String, ContigId>,
}

impl ContigDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `name`, inserting it if it is new.
    pub fn insert(&mut self, name: &str) -> ContigId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = ContigId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, name: &str) -> Option<ContigId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: ContigId) -> &str {
        &self.names[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn parse_node(&self, token: &str) -> Result<ContigNode> {
        let error_msg = || format!("Invalid path node: '{}'", token);
        let last = token.chars().last().ok_or_else(error_msg)?;
        let body = &token[..token.len() - last.len_utf8()];
        if body.is_empty() {
            return Err(error_msg());
        }
        match last {
            'N' => {
                let len: u32 = body.parse().map_err(|_| error_msg())?;
                if len == 0 {
                    return Err(format!("Gap of zero length: '{}'", token));
                }
                Ok(ContigNode::Gap { len })
            }
            '+' | '-' => {
                let id = self
                    .get(body)
                    .ok_or_else(|| format!("Unknown contig in path: '{}'", body))?;
                Ok(ContigNode::Contig {
                    id,
                    reverse: last == '-',
                })
            }
            _ => Err(error_msg()),
        }
    }

    pub fn node(&self, node: ContigNode) -> NodeDisplay<'_> {
        NodeDisplay { dict: self, node }
    }

    pub fn format_path(&self, path: &[ContigNode]) -> String {
        path.iter()
            .map(|&node| self.node(node).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct NodeDisplay<'a> {
    dict: &'a ContigDictionary,
    node: ContigNode,
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            ContigNode::Contig { id, reverse } => {
                write!(f, "{}{}", self.dict.name(id), if reverse { '-' } else { '+' })
            }
            ContigNode::Gap { len } => write!(f, "{}N", len),
        }
    }
}

/// Hands out fresh numeric names for synthesized contigs.
#[derive(Debug)]
pub struct ContigIdAllocator {
    next: u64,
    reserved: HashSet<String>,
}

impl ContigIdAllocator {
    /// Starts after the largest numeric contig name. `reserved` names
    /// (e.g. path labels) are never handed out.
    pub fn new<'a>(dict: &ContigDictionary, reserved: impl IntoIterator<Item = &'a str>) -> Self {
        let next = dict
            .names()
            .filter_map(|name| name.parse::<u64>().ok())
            .max()
            .map_or(dict.len() as u64, |max| max + 1);
        Self {
            next,
            reserved: reserved.into_iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn set_starting_point(&mut self, last_known: &str) {
        if let Ok(last) = last_known.parse::<u64>() {
            self.next = self.next.max(last + 1);
        }
    }

    pub fn allocate(&mut self, dict: &mut ContigDictionary) -> ContigId {
        loop {
            let name = self.next.to_string();
            self.next += 1;
            if dict.get(&name).is_none() && !self.reserved.contains(&name) {
                return dict.insert(&name);
            }
        }
    }
}
