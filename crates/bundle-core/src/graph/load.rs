//! Graph file loading.
//!
//! Two input layouts are understood:
//!
//! - **JSON** (`*.json`): a single document
//!
//!   ```json
//!   {
//!     "directed": true,
//!     "multi_edges": true,
//!     "self_loops": true,
//!     "vertices": ["A", "B"],
//!     "edges": [{ "from": "A", "to": "B", "weight": 2.0 }]
//!   }
//!   ```
//!
//!   Flags default to `true`, `vertices` to empty, `weight` to `1.0`.
//!
//! - **Edge list** (anything else): one `from to [weight]` per line.
//!   `vertex X` declares an isolated vertex, `#` starts a comment.
//!   Edge lists always describe a directed pseudograph.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, instrument};

use super::build::{GraphBuilder, GraphError, WeightedDigraph};

#[derive(Debug, Deserialize)]
struct GraphDocument {
    #[serde(default = "default_true")]
    directed: bool,
    #[serde(default = "default_true")]
    multi_edges: bool,
    #[serde(default = "default_true")]
    self_loops: bool,
    #[serde(default)]
    vertices: Vec<String>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    from: String,
    to: String,
    #[serde(default = "default_weight")]
    weight: f64,
}

const fn default_true() -> bool {
    true
}

const fn default_weight() -> f64 {
    1.0
}

/// Load a graph from `path`, picking the layout from the file extension.
///
/// # Errors
///
/// Returns [`GraphError::Io`] if the file cannot be read, and a parse or
/// validation error if its contents are not a valid graph.
#[instrument]
pub fn load_graph(path: &Path) -> Result<WeightedDigraph, GraphError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let graph = if is_json {
        parse_json(&content)?
    } else {
        parse_edge_list(&content)?
    };

    debug!(
        vertices = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph"
    );
    Ok(graph)
}

/// Parse the JSON graph layout.
///
/// # Errors
///
/// Returns [`GraphError::Json`] for malformed documents and builder errors
/// for edges the declared flags forbid.
pub fn parse_json(content: &str) -> Result<WeightedDigraph, GraphError> {
    let doc: GraphDocument = serde_json::from_str(content)?;

    let mut builder = GraphBuilder::new()
        .directed(doc.directed)
        .multi_edges(doc.multi_edges)
        .self_loops(doc.self_loops);

    for v in &doc.vertices {
        builder.add_vertex(v);
    }
    for edge in &doc.edges {
        builder.add_edge(&edge.from, &edge.to, edge.weight)?;
    }
    Ok(builder.build())
}

/// Parse the whitespace-separated edge list layout.
///
/// # Errors
///
/// Returns [`GraphError::Parse`] with the 1-based line number of the first
/// malformed line.
pub fn parse_edge_list(content: &str) -> Result<WeightedDigraph, GraphError> {
    let mut builder = GraphBuilder::new();

    for (line_no, raw) in content.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            ["vertex", label] => {
                builder.add_vertex(label);
            }
            [from, to] => builder.add_edge(from, to, 1.0)?,
            [from, to, weight] => {
                let weight: f64 = weight.parse().map_err(|_| GraphError::Parse {
                    line: line_no,
                    message: format!("invalid weight '{weight}'"),
                })?;
                builder
                    .add_edge(from, to, weight)
                    .map_err(|err| match err {
                        GraphError::InvalidWeight { .. } => GraphError::Parse {
                            line: line_no,
                            message: err.to_string(),
                        },
                        other => other,
                    })?;
            }
            _ => {
                return Err(GraphError::Parse {
                    line: line_no,
                    message: format!("expected `from to [weight]`, got '{line}'"),
                });
            }
        }
    }

    Ok(builder.build())
}
