use super::{ContigDictionary, ContigGraph, ContigNode, ContigProps};
use crate::utils::Result;
use std::{collections::HashMap, io::BufRead, io::Write};

/// A contig graph read from an ABySS-style DOT file.
#[derive(Debug)]
pub struct DotGraph {
    pub dict: ContigDictionary,
    pub graph: ContigGraph,
    /// k-mer size declared by `graph [k=..]`, if any.
    pub k: Option<u32>,
}

/// Reads one statement per line:
///
/// ```text
/// digraph adj {
/// graph [k=31]
/// edge [d=-30]
/// "0+" [l=120 C=900]
/// "0+" -> "1-" [d=-30]
/// }
/// ```
///
/// Edges without a `d` attribute take the `edge [d=..]` default, or
/// `-(k-1)` when no default is declared.
pub fn read_dot<R: BufRead>(reader: R, k: u32) -> Result<DotGraph> {
    let mut dict = ContigDictionary::new();
    let mut graph = ContigGraph::new();
    let mut graph_k = None;
    let mut default_distance = -(k as i32 - 1);

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading graph line {}: {}", line_number + 1, e))?;
        let with_line = |e: String| format!("Error at graph line {}: {}", line_number + 1, e);
        let line = line.trim().trim_end_matches(';');

        if line.is_empty()
            || line == "}"
            || line.starts_with("digraph")
            || line.starts_with("//")
        {
            continue;
        }

        if let Some(attrs) = line.strip_prefix("graph") {
            let attrs = parse_attrs(attrs).map_err(with_line)?;
            if let Some(value) = attrs.get("k") {
                graph_k = Some(parse_value::<u32>("k", value).map_err(with_line)?);
            }
            continue;
        }

        if let Some(attrs) = line.strip_prefix("edge") {
            let attrs = parse_attrs(attrs).map_err(with_line)?;
            if let Some(value) = attrs.get("d") {
                default_distance = parse_value("d", value).map_err(with_line)?;
            }
            continue;
        }

        let (first, rest) = parse_quoted(line).map_err(with_line)?;
        if let Some(rest) = rest.strip_prefix("->") {
            let (second, attrs) = parse_quoted(rest.trim_start()).map_err(with_line)?;
            let attrs = parse_attrs(attrs).map_err(with_line)?;
            let u = lookup_node(&dict, first).map_err(with_line)?;
            let v = lookup_node(&dict, second).map_err(with_line)?;
            let distance = match attrs.get("d") {
                Some(value) => parse_value("d", value).map_err(with_line)?,
                None => default_distance,
            };
            graph.add_edge(u, v, distance).map_err(with_line)?;
        } else {
            let attrs = parse_attrs(rest).map_err(with_line)?;
            let (name, _) = split_orientation(first).map_err(with_line)?;
            let length = attrs
                .get("l")
                .ok_or_else(|| with_line(format!("Vertex '{}' has no length", first)))?;
            let props = ContigProps {
                length: parse_value("l", length).map_err(with_line)?,
                coverage: match attrs.get("C") {
                    Some(value) => parse_value("C", value).map_err(with_line)?,
                    None => 0,
                },
            };
            let id = dict.insert(name);
            if id.index() == graph.num_contigs() {
                graph.add_vertex(props);
            } else if graph.props(id) != props {
                return Err(with_line(format!(
                    "Conflicting properties for the two strands of contig '{}'",
                    name
                )));
            }
        }
    }

    Ok(DotGraph {
        dict,
        graph,
        k: graph_k,
    })
}

pub fn write_dot<W: Write>(
    writer: &mut W,
    graph: &ContigGraph,
    dict: &ContigDictionary,
    k: u32,
) -> Result<()> {
    let default_distance = -(k as i32 - 1);
    let io_err = |e: std::io::Error| format!("Failed to write graph: {}", e);

    writeln!(writer, "digraph adj {{").map_err(io_err)?;
    writeln!(writer, "graph [k={}]", k).map_err(io_err)?;
    writeln!(writer, "edge [d={}]", default_distance).map_err(io_err)?;
    for index in 0..graph.num_contigs() {
        let id = super::ContigId(index as u32);
        let props = graph.props(id);
        for node in [ContigNode::forward(id), ContigNode::reverse(id)] {
            writeln!(
                writer,
                "\"{}\" [l={} C={}]",
                dict.node(node),
                props.length,
                props.coverage
            )
            .map_err(io_err)?;
        }
    }
    for index in 0..graph.num_contigs() {
        let id = super::ContigId(index as u32);
        for node in [ContigNode::forward(id), ContigNode::reverse(id)] {
            for edge in graph.out_edges(node) {
                write!(writer, "\"{}\" -> \"{}\"", dict.node(node), dict.node(edge.target))
                    .map_err(io_err)?;
                if edge.distance != default_distance {
                    write!(writer, " [d={}]", edge.distance).map_err(io_err)?;
                }
                writeln!(writer).map_err(io_err)?;
            }
        }
    }
    writeln!(writer, "}}").map_err(io_err)?;
    Ok(())
}

fn parse_quoted(s: &str) -> Result<(&str, &str)> {
    let inner = s
        .strip_prefix('"')
        .ok_or_else(|| format!("Expected a quoted vertex name: '{}'", s))?;
    let end = inner
        .find('"')
        .ok_or_else(|| format!("Unterminated vertex name: '{}'", s))?;
    Ok((&inner[..end], inner[end + 1..].trim()))
}

fn parse_attrs(s: &str) -> Result<HashMap<&str, &str>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(HashMap::new());
    }
    let body = s
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("Malformed attribute list: '{}'", s))?;
    let mut attrs = HashMap::new();
    for field in body.split(|c: char| c.is_whitespace() || c == ',') {
        if field.is_empty() {
            continue;
        }
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| format!("Attribute must be in 'key=value' format: '{}'", field))?;
        attrs.insert(key, value.trim_matches('"'));
    }
    Ok(attrs)
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| format!("Invalid value for attribute '{}': '{}'", key, value))
}

fn split_orientation(token: &str) -> Result<(&str, bool)> {
    if let Some(name) = token.strip_suffix('+') {
        Ok((name, false))
    } else if let Some(name) = token.strip_suffix('-') {
        Ok((name, true))
    } else {
        Err(format!("Vertex name lacks an orientation: '{}'", token))
    }
}

fn lookup_node(dict: &ContigDictionary, token: &str) -> Result<ContigNode> {
    let (name, reverse) = split_orientation(token)?;
    let id = dict
        .get(name)
        .ok_or_else(|| format!("Edge refers to undeclared vertex '{}'", token))?;
    Ok(ContigNode::Contig { id, reverse })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ContigId;
    use std::io::Cursor;

    const DOT: &str = r#"digraph adj {
graph [k=5]
edge [d=-4]
"0+" [l=10 C=30]
"0-" [l=10 C=30]
"1+" [l=12 C=40]
"1-" [l=12 C=40]
"0+" -> "1+"
"1+" -> "0-" [d=7 e=2 n=11]
}
"#;

    #[test]
    fn read_graph() {
        let dot = read_dot(Cursor::new(DOT), 5).unwrap();
        assert_eq!(dot.k, Some(5));
        assert_eq!(dot.dict.len(), 2);
        assert_eq!(dot.graph.num_contigs(), 2);
        assert_eq!(
            dot.graph.props(ContigId(1)),
            ContigProps {
                length: 12,
                coverage: 40
            }
        );
        let a = ContigNode::forward(ContigId(0));
        let b = ContigNode::forward(ContigId(1));
        assert_eq!(dot.graph.edge_distance(a, b), Some(-4));
        assert_eq!(dot.graph.edge_distance(a.complement(), b.complement()), None);
        assert_eq!(dot.graph.edge_distance(b, a.complement()), Some(7));
        assert_eq!(dot.graph.edge_distance(a, b.complement()), Some(7));
    }

    #[test]
    fn default_distance_follows_k() {
        let dot = "\"0+\" [l=10]\n\"1+\" [l=10]\n\"0+\" -> \"1+\"\n";
        let dot = read_dot(Cursor::new(dot), 31).unwrap();
        let a = ContigNode::forward(ContigId(0));
        let b = ContigNode::forward(ContigId(1));
        assert_eq!(dot.graph.edge_distance(a, b), Some(-30));
        assert_eq!(dot.k, None);
    }

    #[test]
    fn undeclared_vertex_err() {
        let dot = "\"0+\" [l=10]\n\"0+\" -> \"1+\"\n";
        assert_eq!(
            read_dot(Cursor::new(dot), 31).unwrap_err(),
            "Error at graph line 2: Edge refers to undeclared vertex '1+'"
        );
    }

    #[test]
    fn vertex_without_length_err() {
        let dot = "\"0+\" [C=10]\n";
        assert!(read_dot(Cursor::new(dot), 31).is_err());
    }

    #[test]
    fn write_then_read_preserves_graph() {
        let dot = read_dot(Cursor::new(DOT), 5).unwrap();
        let mut out = Vec::new();
        write_dot(&mut out, &dot.graph, &dot.dict, 5).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"1+\" -> \"0-\" [d=7]"));
        assert!(text.contains("\"0+\" -> \"1+\"\n"));

        let reread = read_dot(Cursor::new(text), 5).unwrap();
        assert_eq!(reread.graph.num_edges(), dot.graph.num_edges());
        assert_eq!(reread.dict.len(), 2);
    }
}
