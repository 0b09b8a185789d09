//! Basic statistics for a weighted graph snapshot.
//!
//! # Statistics Provided
//!
//! - **vertex_count** / **edge_count**: sizes of the graph (parallel edges
//!   counted individually).
//! - **density**: distinct connected ordered pairs over the maximum possible,
//!   `n * (n - 1)` for directed graphs and `n * (n - 1) / 2` for undirected
//!   ones. Self-loops are excluded. Empty and single-vertex graphs have
//!   density 0.0.
//! - **weak_component_count**: connected components when orientation is
//!   ignored.
//! - **isolated_vertex_count**: vertices with no incident edge at all.
//! - **self_loop_count** / **parallel_pair_count**: multigraph features the
//!   scoring's [`ParallelEdgePolicy`](super::ParallelEdgePolicy) has to deal
//!   with.
//! - **max_in_strength** / **max_out_strength**: largest sum of incoming /
//!   outgoing edge weights on a single vertex.

use std::collections::HashMap;

use petgraph::{Direction as PgDirection, algo::connected_components, visit::EdgeRef};
use serde::Serialize;

use super::build::WeightedDigraph;
use super::WeightedGraph;

/// Summary statistics for a [`WeightedDigraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub directed: bool,
    pub vertex_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub weak_component_count: usize,
    pub isolated_vertex_count: usize,
    pub self_loop_count: usize,
    /// Ordered pairs (unordered for undirected graphs) joined by more than one edge.
    pub parallel_pair_count: usize,
    pub max_in_strength: f64,
    pub max_out_strength: f64,
}

impl GraphStats {
    /// Compute statistics for `g`.
    #[must_use]
    pub fn from_graph(g: &WeightedDigraph) -> Self {
        let inner = g.inner();
        let vertex_count = g.node_count();
        let edge_count = g.edge_count();

        let mut pair_counts: HashMap<(usize, usize), usize> = HashMap::new();
        let mut self_loop_count = 0;
        for edge in inner.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                self_loop_count += 1;
                continue;
            }
            let key = if !g.is_directed() && b < a { (b, a) } else { (a, b) };
            *pair_counts.entry(key).or_insert(0) += 1;
        }
        let parallel_pair_count = pair_counts.values().filter(|&&c| c > 1).count();
        let density = compute_density(vertex_count, pair_counts.len(), g.is_directed());

        let isolated_vertex_count = inner
            .node_indices()
            .filter(|&idx| inner.neighbors_undirected(idx).next().is_none())
            .count();

        let strength = |dir: PgDirection| {
            inner
                .node_indices()
                .map(|idx| inner.edges_directed(idx, dir).map(|e| *e.weight()).sum::<f64>())
                .fold(0.0_f64, f64::max)
        };

        Self {
            directed: g.is_directed(),
            vertex_count,
            edge_count,
            density,
            weak_component_count: connected_components(inner),
            isolated_vertex_count,
            self_loop_count,
            parallel_pair_count,
            max_in_strength: strength(PgDirection::Incoming),
            max_out_strength: strength(PgDirection::Outgoing),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(n: usize, pairs: usize, directed: bool) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let max_pairs = if directed {
        n * (n - 1)
    } else {
        n * (n - 1) / 2
    };
    pairs as f64 / max_pairs as f64
}
