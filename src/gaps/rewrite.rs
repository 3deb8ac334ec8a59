use super::{GapConstraint, GapRegistry, GapResolution, ScaffoldPath};
use crate::graph::{ContigDictionary, ContigId, ContigNode, ContigPath};
use crate::utils::Result;
use std::io::Write;

/// Input contigs that appeared among the candidates of a merged gap.
#[derive(Debug, Clone)]
pub struct SeenContigs {
    marks: Vec<bool>,
}

impl SeenContigs {
    pub fn new(num_contigs: usize) -> Self {
        Self {
            marks: vec![false; num_contigs],
        }
    }

    /// Contigs created after loading are ignored.
    pub fn mark_path(&mut self, path: &[ContigNode], seen: bool) {
        for id in path.iter().filter_map(|node| node.contig_id()) {
            if let Some(mark) = self.marks.get_mut(id.index()) {
                *mark = seen;
            }
        }
    }

    pub fn mark_paths(&mut self, paths: &[ContigPath], seen: bool) {
        for path in paths {
            self.mark_path(path, seen);
        }
    }

    /// Clears the contigs used by a resolution or by an input path.
    pub fn unmark_used(&mut self, registry: &GapRegistry, paths: &[ScaffoldPath]) {
        for (_, resolution) in registry.resolutions() {
            if let GapResolution::Resolved(path) = resolution {
                self.mark_path(path, false);
            }
        }
        for path in paths {
            self.mark_path(&path.nodes, false);
        }
    }

    /// Seen contigs, in id order.
    pub fn leftovers(&self) -> impl Iterator<Item = ContigId> + '_ {
        self.marks
            .iter()
            .enumerate()
            .filter(|(_, &seen)| seen)
            .map(|(index, _)| ContigId(index as u32))
    }
}

/// Replaces each gap of `path` by the interior of its resolution. Gaps
/// left unresolved stay as they are.
pub fn rewrite_path(
    dict: &ContigDictionary,
    path: &[ContigNode],
    registry: &GapRegistry,
) -> Result<ContigPath> {
    let mut rewritten = Vec::with_capacity(path.len());
    for (i, &node) in path.iter().enumerate() {
        let ContigNode::Gap { len } = node else {
            rewritten.push(node);
            continue;
        };
        if i == 0 || i + 1 == path.len() {
            return Err(format!(
                "Gap is not flanked by two contigs: {}",
                dict.format_path(path)
            ));
        }
        let gap = GapConstraint::new(path[i - 1], path[i + 1], len)?;
        let gap_name = || {
            format!(
                "{} {} {}",
                dict.node(gap.source),
                dict.node(node),
                dict.node(gap.dest)
            )
        };
        match registry.get(&gap) {
            None => return Err(format!("No gap registered for {}", gap_name())),
            Some(GapResolution::Pending) => {
                return Err(format!("Gap {} was never resolved", gap_name()))
            }
            Some(GapResolution::Unresolved) => rewritten.push(node),
            Some(GapResolution::Resolved(solution)) => {
                if solution.len() < 2 {
                    return Err(format!(
                        "Resolution of gap {} lacks its endpoints",
                        gap_name()
                    ));
                }
                rewritten.extend_from_slice(&solution[1..solution.len() - 1]);
            }
        }
    }
    Ok(rewritten)
}

/// Writes leftover contigs by name, then one `LABEL<TAB>NODES` line per path.
pub fn write_paths<W: Write>(
    writer: &mut W,
    dict: &ContigDictionary,
    paths: &[ScaffoldPath],
    registry: &GapRegistry,
    seen: &SeenContigs,
) -> Result<()> {
    let io_err = |e: std::io::Error| format!("Failed to write paths: {}", e);
    for id in seen.leftovers() {
        writeln!(writer, "{}", dict.name(id)).map_err(io_err)?;
    }
    for path in paths {
        let nodes = if path.has_gap {
            rewrite_path(dict, &path.nodes, registry)?
        } else {
            path.nodes.clone()
        };
        writeln!(writer, "{}\t{}", path.label, dict.format_path(&nodes)).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}
