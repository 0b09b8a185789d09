//! Weighted graph construction on top of `petgraph`.
//!
//! # Overview
//!
//! [`GraphBuilder`] collects vertices and weighted edges, enforcing the
//! multi-edge and self-loop flags it was configured with, and freezes them
//! into a [`WeightedDigraph`]. The frozen graph implements
//! [`WeightedGraph`] and is never mutated again.
//!
//! ## Edge Storage
//!
//! Edges are always stored as `petgraph` directed edges, in insertion order.
//! An undirected graph keeps each edge in the orientation it was added and
//! answers lookups in both orientations.
//!
//! ## Content Hash
//!
//! [`WeightedDigraph::content_hash`] is a BLAKE3 hash of the sorted vertex
//! labels and the sorted edge list (weights hashed bit-exactly). Two graphs
//! with the same hash produce the same scores for the same parameters.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::{
    Direction as PgDirection,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use tracing::instrument;

use super::{ParallelEdgePolicy, WeightedGraph};
use crate::error::ErrorCode;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building or loading a graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A graph file line or document could not be interpreted.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Reading the graph file failed.
    #[error("graph I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON graph document is malformed.
    #[error("graph JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A self-loop was added to a graph that does not allow them.
    #[error("self-loop on '{0}' not allowed in this graph")]
    SelfLoopNotAllowed(String),

    /// A second edge between the same pair was added to a simple graph.
    #[error("parallel edge {from} -> {to} not allowed in this graph")]
    ParallelEdgeNotAllowed { from: String, to: String },

    /// Edge weights must be finite.
    #[error("edge {from} -> {to} has invalid weight {weight}")]
    InvalidWeight {
        from: String,
        to: String,
        weight: f64,
    },
}

impl GraphError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } | Self::Json(_) => ErrorCode::GraphParseError,
            Self::Io(_) => ErrorCode::GraphReadFailed,
            Self::SelfLoopNotAllowed(_) => ErrorCode::SelfLoopNotAllowed,
            Self::ParallelEdgeNotAllowed { .. } => ErrorCode::ParallelEdgeNotAllowed,
            Self::InvalidWeight { .. } => ErrorCode::InvalidWeight,
        }
    }
}

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

/// Incremental builder for a [`WeightedDigraph`].
///
/// Defaults match a "directed pseudograph": directed, parallel edges allowed,
/// self-loops allowed.
#[derive(Debug)]
pub struct GraphBuilder {
    directed: bool,
    multi_edges: bool,
    self_loops: bool,
    graph: DiGraph<String, f64>,
    node_map: HashMap<String, NodeIndex>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            directed: true,
            multi_edges: true,
            self_loops: true,
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    #[must_use]
    pub const fn multi_edges(mut self, allowed: bool) -> Self {
        self.multi_edges = allowed;
        self
    }

    #[must_use]
    pub const fn self_loops(mut self, allowed: bool) -> Self {
        self.self_loops = allowed;
        self
    }

    /// Add a vertex if it is not present yet; returns its index either way.
    pub fn add_vertex(&mut self, label: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(label) {
            return idx;
        }
        let idx = self.graph.add_node(label.to_string());
        self.node_map.insert(label.to_string(), idx);
        idx
    }

    /// Add a weighted edge `from → to`, creating missing endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidWeight`] for a non-finite weight,
    /// [`GraphError::SelfLoopNotAllowed`] or
    /// [`GraphError::ParallelEdgeNotAllowed`] when the builder's flags forbid
    /// the edge.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f64) -> Result<(), GraphError> {
        if !weight.is_finite() {
            return Err(GraphError::InvalidWeight {
                from: from.to_string(),
                to: to.to_string(),
                weight,
            });
        }
        if from == to && !self.self_loops {
            return Err(GraphError::SelfLoopNotAllowed(from.to_string()));
        }

        let a = self.add_vertex(from);
        let b = self.add_vertex(to);

        if !self.multi_edges {
            let exists = self.graph.contains_edge(a, b)
                || (!self.directed && self.graph.contains_edge(b, a));
            if exists {
                return Err(GraphError::ParallelEdgeNotAllowed {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }

        self.graph.add_edge(a, b, weight);
        Ok(())
    }

    /// Freeze the builder into an immutable graph.
    #[must_use]
    pub fn build(self) -> WeightedDigraph {
        WeightedDigraph {
            graph: self.graph,
            node_map: self.node_map,
            directed: self.directed,
            multi_edges: self.multi_edges,
            self_loops: self.self_loops,
        }
    }
}

// ---------------------------------------------------------------------------
// WeightedDigraph
// ---------------------------------------------------------------------------

/// An immutable weighted graph snapshot.
///
/// Nodes carry their string labels, edges their `f64` weights.
#[derive(Debug, Clone)]
pub struct WeightedDigraph {
    graph: DiGraph<String, f64>,
    node_map: HashMap<String, NodeIndex>,
    directed: bool,
    multi_edges: bool,
    self_loops: bool,
}

impl WeightedDigraph {
    /// Shorthand for a directed pseudograph with unit weights.
    ///
    /// # Errors
    ///
    /// Never fails for unit weights; the signature mirrors [`GraphBuilder::add_edge`].
    pub fn from_unit_edges(vertices: &[&str], edges: &[(&str, &str)]) -> Result<Self, GraphError> {
        let mut builder = GraphBuilder::new();
        for v in vertices {
            builder.add_vertex(v);
        }
        for (from, to) in edges {
            builder.add_edge(from, to, 1.0)?;
        }
        Ok(builder.build())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a vertex label.
    #[must_use]
    pub fn node_index(&self, label: &str) -> Option<NodeIndex> {
        self.node_map.get(label).copied()
    }

    /// Underlying `petgraph` graph, for read-only algorithms.
    #[must_use]
    pub const fn inner(&self) -> &DiGraph<String, f64> {
        &self.graph
    }

    /// All edges as `(from, to, weight)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, f64)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
    }

    /// Parallel edge weights between an ordered pair, in insertion order.
    fn parallel_weights(&self, from: NodeIndex, to: NodeIndex) -> Vec<f64> {
        let mut found: Vec<(EdgeIndex, f64)> = self
            .graph
            .edges_directed(from, PgDirection::Outgoing)
            .filter(|e| e.target() == to)
            .map(|e| (e.id(), *e.weight()))
            .collect();

        if !self.directed && from != to {
            found.extend(
                self.graph
                    .edges_directed(to, PgDirection::Outgoing)
                    .filter(|e| e.target() == from)
                    .map(|e| (e.id(), *e.weight())),
            );
        }

        // petgraph walks adjacency lists newest-first.
        found.sort_by_key(|(id, _)| *id);
        found.into_iter().map(|(_, w)| w).collect()
    }

    /// BLAKE3 hash of the vertex and edge sets, prefixed with `blake3:`.
    #[must_use]
    #[instrument(skip(self))]
    pub fn content_hash(&self) -> String {
        let mut labels: Vec<&str> = self
            .graph
            .node_indices()
            .map(|i| self.graph[i].as_str())
            .collect();
        labels.sort_unstable();

        let mut edges: Vec<(&str, &str, u64)> = self
            .edges()
            .map(|(a, b, w)| {
                let (a, b) = (self.graph[a].as_str(), self.graph[b].as_str());
                let (a, b) = if !self.directed && b < a { (b, a) } else { (a, b) };
                (a, b, w.to_bits())
            })
            .collect();
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        let kind: &[u8] = if self.directed {
            b"directed\n"
        } else {
            b"undirected\n"
        };
        hasher.update(kind);
        for label in labels {
            hasher.update(label.as_bytes());
            hasher.update(b"\n");
        }
        for (a, b, bits) in edges {
            hasher.update(format!("{a}\x1f{b}\x1f{bits:016x}\n").as_bytes());
        }
        format!("blake3:{}", hasher.finalize().to_hex())
    }
}

impl WeightedGraph for WeightedDigraph {
    type Vertex = NodeIndex;

    fn vertices(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    fn label(&self, v: NodeIndex) -> &str {
        self.graph.node_weight(v).map_or("", String::as_str)
    }

    fn find_vertex(&self, label: &str) -> Option<NodeIndex> {
        self.node_index(label)
    }

    fn contains_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.graph.contains_edge(from, to) || (!self.directed && self.graph.contains_edge(to, from))
    }

    fn edge_weight(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        policy: ParallelEdgePolicy,
    ) -> Option<f64> {
        policy.resolve(self.parallel_weights(from, to))
    }

    fn is_directed(&self) -> bool {
        self.directed
    }

    fn allows_multi_edges(&self) -> bool {
        self.multi_edges
    }

    fn allows_self_loops(&self) -> bool {
        self.self_loops
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(g: &WeightedDigraph, label: &str) -> NodeIndex {
        g.node_index(label).expect("vertex must exist")
    }

    #[test]
    fn add_vertex_is_idempotent() {
        let mut builder = GraphBuilder::new();
        let a1 = builder.add_vertex("A");
        let a2 = builder.add_vertex("A");
        assert_eq!(a1, a2);
        assert_eq!(builder.build().node_count(), 1);
    }

    #[test]
    fn add_edge_creates_missing_endpoints() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("A", "B", 2.5).expect("edge must be accepted");
        let g = builder.build();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.contains_edge(idx(&g, "A"), idx(&g, "B")));
        assert!(!g.contains_edge(idx(&g, "B"), idx(&g, "A")));
    }

    #[test]
    fn rejects_non_finite_weight() {
        let mut builder = GraphBuilder::new();
        let err = builder.add_edge("A", "B", f64::NAN).expect_err("NaN weight");
        assert_eq!(err.error_code(), ErrorCode::InvalidWeight);
    }

    #[test]
    fn rejects_self_loop_when_disallowed() {
        let mut builder = GraphBuilder::new().self_loops(false);
        let err = builder.add_edge("A", "A", 1.0).expect_err("self-loop");
        assert!(matches!(err, GraphError::SelfLoopNotAllowed(ref v) if v == "A"));
    }

    #[test]
    fn rejects_parallel_edge_when_disallowed() {
        let mut builder = GraphBuilder::new().multi_edges(false);
        builder.add_edge("A", "B", 1.0).expect("first edge");
        let err = builder.add_edge("A", "B", 1.0).expect_err("parallel edge");
        assert!(matches!(err, GraphError::ParallelEdgeNotAllowed { .. }));
        // Opposite orientation is a distinct edge in a directed graph.
        builder.add_edge("B", "A", 1.0).expect("reverse edge");
    }

    #[test]
    fn undirected_simple_graph_rejects_reverse_duplicate() {
        let mut builder = GraphBuilder::new().directed(false).multi_edges(false);
        builder.add_edge("A", "B", 1.0).expect("first edge");
        assert!(builder.add_edge("B", "A", 1.0).is_err());
    }

    #[test]
    fn undirected_lookup_ignores_orientation() {
        let mut builder = GraphBuilder::new().directed(false);
        builder.add_edge("A", "B", 3.0).expect("edge");
        let g = builder.build();
        let (a, b) = (idx(&g, "A"), idx(&g, "B"));
        assert!(g.contains_edge(b, a));
        assert_eq!(g.edge_weight(b, a, ParallelEdgePolicy::Sum), Some(3.0));
    }

    #[test]
    fn parallel_edges_resolve_per_policy() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("A", "B", 0.25).expect("edge");
        builder.add_edge("A", "B", 0.5).expect("edge");
        builder.add_edge("A", "B", 0.125).expect("edge");
        let g = builder.build();
        let (a, b) = (idx(&g, "A"), idx(&g, "B"));

        assert_eq!(g.edge_weight(a, b, ParallelEdgePolicy::Sum), Some(0.875));
        assert_eq!(g.edge_weight(a, b, ParallelEdgePolicy::First), Some(0.25));
        assert_eq!(g.edge_weight(a, b, ParallelEdgePolicy::Max), Some(0.5));
        assert_eq!(g.edge_weight(b, a, ParallelEdgePolicy::Sum), None);
    }

    #[test]
    fn vertices_follow_insertion_order() {
        let g = WeightedDigraph::from_unit_edges(&["C", "A", "B"], &[]).expect("graph");
        let labels: Vec<&str> = g.vertices().into_iter().map(|v| g.label(v)).collect();
        assert_eq!(labels, ["C", "A", "B"]);
    }

    #[test]
    fn content_hash_ignores_insertion_order() {
        let g1 = WeightedDigraph::from_unit_edges(&["A", "B", "C"], &[("A", "B"), ("B", "C")])
            .expect("graph");
        let g2 = WeightedDigraph::from_unit_edges(&["C", "B", "A"], &[("B", "C"), ("A", "B")])
            .expect("graph");
        assert_eq!(g1.content_hash(), g2.content_hash());
        assert!(g1.content_hash().starts_with("blake3:"));
    }

    #[test]
    fn content_hash_changes_with_weight() {
        let mut b1 = GraphBuilder::new();
        b1.add_edge("A", "B", 1.0).expect("edge");
        let mut b2 = GraphBuilder::new();
        b2.add_edge("A", "B", 2.0).expect("edge");
        assert_ne!(b1.build().content_hash(), b2.build().content_hash());
    }
}
