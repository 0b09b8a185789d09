//! Weighted graph model consumed by the Bundle Index engine.
//!
//! # Overview
//!
//! The engine never touches a concrete graph type. It is written against the
//! [`WeightedGraph`] trait, which exposes exactly what the scoring needs:
//! vertex enumeration, an ordered-pair edge test, and an edge-weight lookup
//! with a configurable [`ParallelEdgePolicy`].
//!
//! [`WeightedDigraph`] is the bundled implementation, a thin wrapper around a
//! `petgraph` graph with a label index.
//!
//! ## Pipeline
//!
//! ```text
//! graph file (.json | edge list)
//!        ↓  load::load_graph()
//! GraphBuilder ── add_vertex / add_edge
//!        ↓  build()
//! WeightedDigraph (immutable snapshot)
//!        ↓  stats::GraphStats::from_graph()
//! GraphStats (density, strengths, components, …)
//! ```

pub mod build;
pub mod load;
pub mod stats;

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use build::{GraphBuilder, GraphError, WeightedDigraph};
pub use load::load_graph;
pub use stats::GraphStats;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which incident edges count toward a vertex.
///
/// `Incoming` looks at edges `member → v`, `Outgoing` at edges `v → member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Incoming,
    Outgoing,
}

impl Direction {
    /// Orient a `(member, center)` pair into the `(from, to)` edge it names.
    #[must_use]
    pub fn orient<V>(self, member: V, center: V) -> (V, V) {
        match self {
            Self::Incoming => (member, center),
            Self::Outgoing => (center, member),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incoming" | "in" => Ok(Self::Incoming),
            "outgoing" | "out" => Ok(Self::Outgoing),
            other => Err(format!(
                "unknown direction '{other}' (expected incoming or outgoing)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// ParallelEdgePolicy
// ---------------------------------------------------------------------------

/// How "the" weight between an ordered pair is resolved when the graph holds
/// several parallel edges for it.
///
/// Every policy is deterministic for a given graph snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallelEdgePolicy {
    /// Sum of all parallel edge weights.
    #[default]
    Sum,
    /// Weight of the earliest inserted edge.
    First,
    /// Largest parallel edge weight.
    Max,
}

impl ParallelEdgePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::First => "first",
            Self::Max => "max",
        }
    }

    /// Fold weights given in insertion order. Returns `None` for no edges.
    #[must_use]
    pub fn resolve(self, weights: impl IntoIterator<Item = f64>) -> Option<f64> {
        let mut iter = weights.into_iter();
        let first = iter.next()?;
        Some(match self {
            Self::Sum => iter.fold(first, |acc, w| acc + w),
            Self::First => first,
            Self::Max => iter.fold(first, f64::max),
        })
    }
}

impl fmt::Display for ParallelEdgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParallelEdgePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "first" => Ok(Self::First),
            "max" => Ok(Self::Max),
            other => Err(format!(
                "unknown parallel edge policy '{other}' (expected sum, first or max)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// WeightedGraph
// ---------------------------------------------------------------------------

/// Read-only view of a weighted graph, as required by the scoring engine.
///
/// Implementations must be immutable for the lifetime of a borrow: the engine
/// shares one `&G` across all worker threads.
pub trait WeightedGraph: Send + Sync {
    /// Cheap vertex handle.
    type Vertex: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync;

    /// All vertices, each exactly once, in the graph's enumeration order.
    fn vertices(&self) -> Vec<Self::Vertex>;

    fn vertex_count(&self) -> usize;

    /// Stable external label of a vertex.
    fn label(&self, v: Self::Vertex) -> &str;

    fn find_vertex(&self, label: &str) -> Option<Self::Vertex>;

    /// Whether at least one edge `from → to` exists. Undirected graphs ignore
    /// orientation.
    fn contains_edge(&self, from: Self::Vertex, to: Self::Vertex) -> bool;

    /// Resolved weight of the edge(s) `from → to`, or `None` if there is none.
    fn edge_weight(
        &self,
        from: Self::Vertex,
        to: Self::Vertex,
        policy: ParallelEdgePolicy,
    ) -> Option<f64>;

    fn is_directed(&self) -> bool;

    fn allows_multi_edges(&self) -> bool;

    fn allows_self_loops(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_orients_pairs() {
        assert_eq!(Direction::Incoming.orient("m", "v"), ("m", "v"));
        assert_eq!(Direction::Outgoing.orient("m", "v"), ("v", "m"));
    }

    #[test]
    fn direction_parses_aliases() {
        assert_eq!("IN".parse::<Direction>(), Ok(Direction::Incoming));
        assert_eq!("outgoing".parse::<Direction>(), Ok(Direction::Outgoing));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn policy_resolves_in_insertion_order() {
        let weights = [2.0, 5.0, 1.0];
        assert_eq!(ParallelEdgePolicy::Sum.resolve(weights), Some(8.0));
        assert_eq!(ParallelEdgePolicy::First.resolve(weights), Some(2.0));
        assert_eq!(ParallelEdgePolicy::Max.resolve(weights), Some(5.0));
        assert_eq!(ParallelEdgePolicy::Sum.resolve([]), None);
    }

    #[test]
    fn policy_round_trips_through_display() {
        for policy in [
            ParallelEdgePolicy::Sum,
            ParallelEdgePolicy::First,
            ParallelEdgePolicy::Max,
        ] {
            assert_eq!(policy.to_string().parse::<ParallelEdgePolicy>(), Ok(policy));
        }
    }
}
