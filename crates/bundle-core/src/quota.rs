//! Per-vertex quota tables.
//!
//! A quota is the combined incident weight a critical set must reach for the
//! set to count toward a vertex's score. Tables are either loaded explicitly
//! from a JSON map or derived from the graph with a [`QuotaPolicy`].

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::graph::{Direction, ParallelEdgePolicy, WeightedGraph};

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("quota fraction must be finite and non-negative, got {0}")]
    InvalidFraction(f64),

    #[error("failed to read quota file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid quota file: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuotaError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidFraction(_) => ErrorCode::InvalidQuota,
            Self::Io(_) | Self::Json(_) => ErrorCode::QuotaReadFailed,
        }
    }
}

/// How a quota table is derived from a graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "policy", content = "value")]
pub enum QuotaPolicy {
    /// The same quota for every vertex.
    Uniform(f64),
    /// `fraction × strength(v)`, strength taken in the scoring direction.
    StrengthFraction(f64),
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::Uniform(1.0)
    }
}

/// Mapping from vertex label to quota.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaTable {
    quotas: HashMap<String, f64>,
}

/// Labels that differ between a quota table and a graph's vertex set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDiff {
    /// Graph vertices with no quota.
    pub missing: Vec<String>,
    /// Quota entries with no matching vertex.
    pub extra: Vec<String>,
}

impl KeyDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

impl QuotaTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quota for `label`, returning the previous value.
    pub fn insert(&mut self, label: impl Into<String>, quota: f64) -> Option<f64> {
        self.quotas.insert(label.into(), quota)
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.quotas.get(label).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.quotas.iter().map(|(k, &v)| (k.as_str(), v))
    }

    #[must_use]
    pub const fn as_map(&self) -> &HashMap<String, f64> {
        &self.quotas
    }

    /// Every vertex of `graph` gets `quota`.
    #[must_use]
    pub fn uniform<G: WeightedGraph>(graph: &G, quota: f64) -> Self {
        graph
            .vertices()
            .into_iter()
            .map(|v| (graph.label(v).to_string(), quota))
            .collect()
    }

    /// `quota(v) = fraction × Σ w(u, v)` over neighbors `u` in `direction`,
    /// each pair resolved with `policy`. The sum runs over every vertex, so a
    /// self-loop on `v` adds to its own quota.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::InvalidFraction`] for a negative or non-finite
    /// fraction.
    #[instrument(skip(graph))]
    pub fn strength_fraction<G: WeightedGraph>(
        graph: &G,
        fraction: f64,
        direction: Direction,
        policy: ParallelEdgePolicy,
    ) -> Result<Self, QuotaError> {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(QuotaError::InvalidFraction(fraction));
        }

        let vertices = graph.vertices();
        let table: Self = vertices
            .iter()
            .map(|&v| {
                let strength: f64 = vertices
                    .iter()
                    .filter_map(|&u| {
                        let (from, to) = direction.orient(u, v);
                        graph.edge_weight(from, to, policy)
                    })
                    .sum();
                (graph.label(v).to_string(), fraction * strength)
            })
            .collect();

        debug!(vertices = table.len(), "derived strength-fraction quotas");
        Ok(table)
    }

    /// Derive a table from `policy`.
    ///
    /// # Errors
    ///
    /// Propagates [`QuotaTable::strength_fraction`] errors.
    pub fn from_policy<G: WeightedGraph>(
        graph: &G,
        policy: QuotaPolicy,
        direction: Direction,
        parallel_edges: ParallelEdgePolicy,
    ) -> Result<Self, QuotaError> {
        match policy {
            QuotaPolicy::Uniform(q) => Ok(Self::uniform(graph, q)),
            QuotaPolicy::StrengthFraction(f) => {
                Self::strength_fraction(graph, f, direction, parallel_edges)
            }
        }
    }

    /// Read a JSON object `{ "label": quota, ... }`.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Io`] or [`QuotaError::Json`].
    #[instrument]
    pub fn from_json_file(path: &Path) -> Result<Self, QuotaError> {
        let content = fs::read_to_string(path)?;
        let table: Self = serde_json::from_str(&content)?;
        debug!(entries = table.len(), "loaded quota file");
        Ok(table)
    }

    /// Compare the table's keys against the vertex set of `graph`.
    /// Both lists come back sorted.
    #[must_use]
    pub fn key_diff<G: WeightedGraph>(&self, graph: &G) -> KeyDiff {
        let labels: BTreeSet<&str> = graph.vertices().into_iter().map(|v| graph.label(v)).collect();
        let keys: BTreeSet<&str> = self.quotas.keys().map(String::as_str).collect();

        KeyDiff {
            missing: labels.difference(&keys).map(|s| (*s).to_string()).collect(),
            extra: keys.difference(&labels).map(|s| (*s).to_string()).collect(),
        }
    }
}

impl FromIterator<(String, f64)> for QuotaTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            quotas: iter.into_iter().collect(),
        }
    }
}
