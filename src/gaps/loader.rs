use super::{GapConstraint, GapRegistry};
use crate::graph::{ContigDictionary, ContigNode, ContigPath};
use crate::utils::{open_reader, Result};
use std::{io::BufRead, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldPath {
    pub label: String,
    pub nodes: ContigPath,
    /// Whether the path holds at least one gap.
    pub has_gap: bool,
}

/// Parses `LABEL NODE NODE ...`. Blank lines yield `None`.
pub fn parse_path_line(dict: &ContigDictionary, line: &str) -> Result<Option<ScaffoldPath>> {
    let mut fields = line.split_whitespace();
    let Some(label) = fields.next() else {
        return Ok(None);
    };
    let nodes = fields
        .map(|token| dict.parse_node(token))
        .collect::<Result<ContigPath>>()?;
    if nodes.is_empty() {
        return Err(format!("Path '{}' has no nodes", label));
    }
    let has_gap = nodes.iter().any(|node| node.is_gap());
    Ok(Some(ScaffoldPath {
        label: label.to_string(),
        nodes,
        has_gap,
    }))
}

/// Gaps of `nodes`, each keyed by the contigs on either side of it.
pub fn path_gaps(nodes: &[ContigNode]) -> Result<Vec<GapConstraint>> {
    let mut gaps = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let ContigNode::Gap { len } = *node else {
            continue;
        };
        if i == 0 || i + 1 == nodes.len() {
            return Err(format!("Gap at position {} is not flanked by two contigs", i + 1));
        }
        let (prev, next) = (nodes[i - 1], nodes[i + 1]);
        if prev.is_gap() || next.is_gap() {
            return Err(format!("Consecutive gaps at position {}", i + 1));
        }
        gaps.push(
            GapConstraint::new(prev, next, len)
                .map_err(|e| format!("{} at position {}", e, i + 1))?,
        );
    }
    Ok(gaps)
}

pub fn read_paths<R: BufRead>(
    reader: R,
    dict: &ContigDictionary,
    registry: &mut GapRegistry,
) -> Result<Vec<ScaffoldPath>> {
    let mut paths = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let with_line = |e: String| format!("Error at path line {}: {}", line_number + 1, e);
        let line = line.map_err(|e| with_line(e.to_string()))?;
        let Some(path) = parse_path_line(dict, &line).map_err(with_line)? else {
            continue;
        };
        for gap in path_gaps(&path.nodes).map_err(with_line)? {
            registry.insert(gap);
        }
        paths.push(path);
    }
    Ok(paths)
}

pub fn load_paths(
    path: &Path,
    dict: &ContigDictionary,
    registry: &mut GapRegistry,
) -> Result<Vec<ScaffoldPath>> {
    log::info!("Reading `{}`", path.display());
    let paths = read_paths(open_reader(path)?, dict, registry)
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    log::info!(
        "Read {} paths with {} distinct gaps",
        paths.len(),
        registry.len()
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ContigId;
    use std::io::Cursor;

    fn dict() -> ContigDictionary {
        let mut dict = ContigDictionary::new();
        for name in ["0", "1", "2", "3"] {
            dict.insert(name);
        }
        dict
    }

    #[test]
    fn paths_register_distinct_gaps() {
        let dict = dict();
        let mut registry = GapRegistry::new();
        let input = "4\t0+ 12N 1- 2+\n\n5\t3+ 2-\n6\t0+ 12N 1-\n7 2+ 5N 3+\n";
        let paths = read_paths(Cursor::new(input), &dict, &mut registry).unwrap();
        assert_eq!(paths.len(), 4);
        assert_eq!(
            paths.iter().map(|p| p.has_gap).collect::<Vec<_>>(),
            vec![true, false, true, true]
        );
        assert_eq!(paths[1].label, "5");
        assert_eq!(registry.len(), 2);
        let first = GapConstraint {
            source: ContigNode::forward(ContigId(0)),
            dest: ContigNode::reverse(ContigId(1)),
            distance: 12,
        };
        assert!(registry.get(&first).is_some());
    }

    #[test]
    fn unflanked_gap_err() {
        let dict = dict();
        let mut registry = GapRegistry::new();
        let result = read_paths(Cursor::new("4 0+ 1+\n5 0+ 10N\n"), &dict, &mut registry);
        assert_eq!(
            result.unwrap_err(),
            "Error at path line 2: Gap at position 2 is not flanked by two contigs"
        );
        assert!(read_paths(Cursor::new("4 5N 0+ 1+\n"), &dict, &mut registry).is_err());
    }

    #[test]
    fn consecutive_gaps_err() {
        let dict = dict();
        let mut registry = GapRegistry::new();
        let result = read_paths(Cursor::new("4 0+ 10N 5N 1+\n"), &dict, &mut registry);
        assert!(result.is_err());
    }

    #[test]
    fn oversized_gap_err() {
        let dict = dict();
        let path = parse_path_line(&dict, "5 0+ 3000000000N 1+").unwrap().unwrap();
        assert_eq!(
            path_gaps(&path.nodes).unwrap_err(),
            "Gap of 3000000000 bases is longer than supported at position 2"
        );
        let mut registry = GapRegistry::new();
        assert!(read_paths(Cursor::new("5 0+ 3000000000N 1+\n"), &dict, &mut registry).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn malformed_nodes_err() {
        let dict = dict();
        let mut registry = GapRegistry::new();
        let result = read_paths(Cursor::new("4 0+ 9+\n"), &dict, &mut registry);
        assert_eq!(
            result.unwrap_err(),
            "Error at path line 1: Unknown contig in path: '9'"
        );
        assert!(read_paths(Cursor::new("4\n"), &dict, &mut registry).is_err());
    }
}
