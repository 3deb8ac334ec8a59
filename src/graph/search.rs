use super::{ContigGraph, ContigNode, ContigPath};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Paths from the source (excluded) to the destination (included).
    pub paths: Vec<ContigPath>,
    /// Vertices expanded before the search ended.
    pub visited: usize,
}

struct Frame {
    node: ContigNode,
    /// Distance from the end of the source to the end of `node`.
    end: i32,
    next_edge: usize,
}

/// Enumerates every path from `source` to `dest` whose gap, measured
/// from the end of `source` to the start of `dest`, is at most
/// `max_distance`. The search stops as soon as `max_cost` vertices have
/// been expanded; callers must then treat the result as incomplete.
pub fn constrained_search(
    graph: &ContigGraph,
    source: ContigNode,
    dest: ContigNode,
    max_distance: i32,
    max_cost: usize,
) -> SearchResult {
    let mut result = SearchResult::default();
    let mut path: ContigPath = Vec::new();
    let mut stack = vec![Frame {
        node: source,
        end: 0,
        next_edge: 0,
    }];
    result.visited += 1;
    if result.visited >= max_cost {
        return result;
    }

    while let Some(frame) = stack.last_mut() {
        let Some(edge) = graph.out_edges(frame.node).get(frame.next_edge) else {
            stack.pop();
            if !stack.is_empty() {
                path.pop();
            }
            continue;
        };
        frame.next_edge += 1;

        let start = frame.end.saturating_add(edge.distance);
        if start > max_distance {
            continue;
        }
        if edge.target == dest {
            let mut found = path.clone();
            found.push(dest);
            result.paths.push(found);
            continue;
        }

        result.visited += 1;
        if result.visited >= max_cost {
            return result;
        }
        let length = edge
            .target
            .contig_id()
            .map_or(0, |id| {
                i32::try_from(graph.props(id).length).unwrap_or(i32::MAX)
            });
        path.push(edge.target);
        stack.push(Frame {
            node: edge.target,
            end: start.saturating_add(length),
            next_edge: 0,
        });
    }

    result
}
