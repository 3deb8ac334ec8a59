use crate::graph::{ContigNode, ContigPath};
use crate::utils::Result;
use std::collections::{btree_map::Entry, BTreeMap};

/// A run of unknown bases between two contigs of a scaffold path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GapConstraint {
    pub source: ContigNode,
    pub dest: ContigNode,
    /// Estimated gap size; positive like the graph's gap distances.
    pub distance: i32,
}

impl GapConstraint {
    /// The gap of `len` unknown bases between `source` and `dest`.
    pub fn new(source: ContigNode, dest: ContigNode, len: u32) -> Result<Self> {
        let distance = i32::try_from(len)
            .map_err(|_| format!("Gap of {} bases is longer than supported", len))?;
        Ok(Self {
            source,
            dest,
            distance,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapResolution {
    Pending,
    Unresolved,
    /// Path from the source to the destination, both included.
    Resolved(ContigPath),
}

/// The distinct gaps of all paths, each resolved at most once.
#[derive(Debug, Default)]
pub struct GapRegistry {
    gaps: BTreeMap<GapConstraint, GapResolution>,
}

impl GapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `gap` as pending. Returns false if it is already known.
    pub fn insert(&mut self, gap: GapConstraint) -> bool {
        match self.gaps.entry(gap) {
            Entry::Vacant(entry) => {
                entry.insert(GapResolution::Pending);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn get(&self, gap: &GapConstraint) -> Option<&GapResolution> {
        self.gaps.get(gap)
    }

    /// Gaps still awaiting resolution, in key order.
    pub fn pending(&self) -> Vec<GapConstraint> {
        self.gaps
            .iter()
            .filter(|(_, resolution)| **resolution == GapResolution::Pending)
            .map(|(gap, _)| *gap)
            .collect()
    }

    pub fn resolutions(&self) -> impl Iterator<Item = (&GapConstraint, &GapResolution)> {
        self.gaps.iter()
    }

    pub fn resolve(&mut self, gap: &GapConstraint, resolution: GapResolution) -> Result<()> {
        match self.gaps.get_mut(gap) {
            Some(slot @ GapResolution::Pending) => {
                *slot = resolution;
                Ok(())
            }
            Some(_) => Err(format!("Gap resolved twice: {:?}", gap)),
            None => Err(format!("Gap is not registered: {:?}", gap)),
        }
    }
}
