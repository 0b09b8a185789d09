//! The Bundle Index engine.
//!
//! # Overview
//!
//! The Bundle Index of a vertex `v` counts the critical sets of `v` whose
//! combined incident weight reaches `quota(v)`. A vertex whose quota can be
//! met by many small groups of neighbors is hard to isolate and ranks high.
//!
//! # Algorithm
//!
//! ```text
//! for each vertex v (one task per vertex):
//!     for each critical set S of v with |S| ≤ k:
//!         w(S) = Σ weight(u → v)   for u in S   (incoming)
//!              = Σ weight(v → u)   for u in S   (outgoing)
//!         if w(S) ≥ quota(v): raw(v) += 1
//! ```
//!
//! Tasks run on a rayon pool built for the computation. Each task returns a
//! `Result`, so a failing vertex never leaves a hole in the score map: the
//! computation either yields a score for every vertex or an error naming
//! every vertex that failed.
//!
//! # Output
//!
//! Raw counts, or their normalized shares (see [`crate::normalize`]).

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use bundle_core::error::ErrorCode;
use bundle_core::graph::{Direction, ParallelEdgePolicy, WeightedGraph};
use bundle_core::quota::QuotaTable;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::normalize::{NormalizeError, normalize_scores};
use crate::subsets::{Enumeration, SubsetGenerator};

/// Emitted subsets between two cancellation checks inside one task.
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation handle. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Options for one Bundle Index computation.
#[derive(Debug, Clone)]
pub struct BundleIndexConfig {
    /// Largest critical set size. Must be at least 1.
    pub k: usize,
    /// Replace raw counts with shares of the total.
    pub normalize: bool,
    pub direction: Direction,
    /// Worker threads. Must be at least 1.
    pub workers: usize,
    pub parallel_edges: ParallelEdgePolicy,
    pub enumeration: Enumeration,
    pub cancel: Option<CancelFlag>,
}

impl Default for BundleIndexConfig {
    fn default() -> Self {
        Self {
            k: 1,
            normalize: true,
            direction: Direction::Incoming,
            workers: 1,
            parallel_edges: ParallelEdgePolicy::Sum,
            enumeration: Enumeration::Auto,
            cancel: None,
        }
    }
}

impl BundleIndexConfig {
    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a single vertex task failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskError {
    #[error("no edge weight between '{member}' and '{vertex}' although they are adjacent")]
    MissingWeight { vertex: String, member: String },

    #[error("cancelled")]
    Cancelled,
}

/// A failed vertex and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VertexFailure {
    pub vertex: String,
    pub error: TaskError,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(
        "quota table does not match the vertex set (missing: {missing:?}, extra: {extra:?})"
    )]
    QuotaMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("critical set cardinality k must be at least 1")]
    InvalidCardinality,

    #[error("worker count must be at least 1")]
    InvalidWorkers,

    #[error("quota for '{vertex}' must be finite and non-negative, got {value}")]
    InvalidQuota { vertex: String, value: f64 },

    #[error("vertex '{0}' not found")]
    VertexNotFound(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("{} vertex task(s) failed, first: {}", .failures.len(), first_failure(.failures))]
    Scoring { failures: Vec<VertexFailure> },

    #[error("computation cancelled")]
    Cancelled,
}

fn first_failure(failures: &[VertexFailure]) -> String {
    failures
        .first()
        .map(|f| format!("{}: {}", f.vertex, f.error))
        .unwrap_or_default()
}

impl IndexError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::QuotaMismatch { .. } => ErrorCode::QuotaMismatch,
            Self::InvalidCardinality => ErrorCode::InvalidCardinality,
            Self::InvalidWorkers => ErrorCode::InvalidWorkers,
            Self::InvalidQuota { .. } => ErrorCode::InvalidQuota,
            Self::VertexNotFound(_) => ErrorCode::VertexNotFound,
            Self::Normalize(e) => e.error_code(),
            Self::Pool(_) => ErrorCode::WorkerPoolFailed,
            Self::Scoring { .. } => ErrorCode::VertexTaskFailed,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Bundle Index scores for every vertex of one graph snapshot.
///
/// Immutable once computed. Changed inputs need a new instance.
#[derive(Debug, Clone)]
pub struct BundleIndex {
    scores: HashMap<String, f64>,
    config: BundleIndexConfig,
}

impl BundleIndex {
    /// Compute with [`BundleIndexConfig::default`].
    ///
    /// # Errors
    ///
    /// See [`BundleIndex::compute`].
    pub fn new<G: WeightedGraph>(graph: &G, quotas: &QuotaTable) -> Result<Self, IndexError> {
        Self::compute(graph, quotas, &BundleIndexConfig::default())
    }

    /// Validate the inputs, score every vertex on a pool of
    /// `config.workers` threads, and optionally normalize.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before any work starts. After the
    /// parallel phase, [`IndexError::Scoring`] lists every failed vertex, or
    /// [`IndexError::Cancelled`] if the only failures were cancellations.
    #[instrument(skip_all, fields(vertices = graph.vertex_count(), k = config.k, workers = config.workers))]
    pub fn compute<G: WeightedGraph>(
        graph: &G,
        quotas: &QuotaTable,
        config: &BundleIndexConfig,
    ) -> Result<Self, IndexError> {
        let quota_by_vertex = validate(graph, quotas, config)?;
        let started = Instant::now();

        let vertices = graph.vertices();
        let labels: Vec<String> = vertices.iter().map(|&v| graph.label(v).to_string()).collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("bundle-worker-{i}"))
            .build()?;

        let results: Vec<Result<f64, TaskError>> = pool.install(|| {
            vertices
                .par_iter()
                .zip(quota_by_vertex.par_iter())
                .map(|(&v, &quota)| score_vertex(graph, &vertices, v, quota, config))
                .collect()
        });
        drop(pool);

        let mut raw = HashMap::with_capacity(labels.len());
        let mut failures = Vec::new();
        for (label, result) in labels.iter().zip(results) {
            match result {
                Ok(score) => {
                    debug!(vertex = %label, raw = score, "scored vertex");
                    raw.insert(label.clone(), score);
                }
                Err(error) => {
                    warn!(vertex = %label, %error, "vertex task failed");
                    failures.push(VertexFailure {
                        vertex: label.clone(),
                        error,
                    });
                }
            }
        }

        if !failures.is_empty() {
            if failures.iter().all(|f| f.error == TaskError::Cancelled) {
                return Err(IndexError::Cancelled);
            }
            return Err(IndexError::Scoring { failures });
        }

        let scores = if config.normalize {
            normalize_scores(&labels, raw)?
        } else {
            raw
        };

        info!(
            vertices = labels.len(),
            k = config.k,
            workers = config.workers,
            normalized = config.normalize,
            elapsed_ms = started.elapsed().as_millis(),
            "bundle index computed"
        );

        Ok(Self {
            scores,
            config: config.clone(),
        })
    }

    #[must_use]
    pub const fn scores(&self) -> &HashMap<String, f64> {
        &self.scores
    }

    /// Score of one vertex.
    ///
    /// # Errors
    ///
    /// [`IndexError::VertexNotFound`] for a label outside the graph.
    pub fn score(&self, label: &str) -> Result<f64, IndexError> {
        self.scores
            .get(label)
            .copied()
            .ok_or_else(|| IndexError::VertexNotFound(label.to_string()))
    }

    /// All scores, highest first, ties broken by label.
    #[must_use]
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> =
            self.scores.iter().map(|(k, &v)| (k.clone(), v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    #[must_use]
    pub const fn config(&self) -> &BundleIndexConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_normalized(&self) -> bool {
        self.config.normalize
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Check the inputs of a computation and return the quotas in vertex
/// enumeration order. [`BundleIndex::compute`] runs this first; callers that
/// score a single vertex use it to accept exactly the same inputs.
///
/// # Errors
///
/// [`IndexError::QuotaMismatch`], [`IndexError::InvalidCardinality`],
/// [`IndexError::InvalidWorkers`] or [`IndexError::InvalidQuota`], in that
/// order of precedence.
pub fn validate<G: WeightedGraph>(
    graph: &G,
    quotas: &QuotaTable,
    config: &BundleIndexConfig,
) -> Result<Vec<f64>, IndexError> {
    let diff = quotas.key_diff(graph);
    if !diff.is_empty() {
        return Err(IndexError::QuotaMismatch {
            missing: diff.missing,
            extra: diff.extra,
        });
    }
    if config.k == 0 {
        return Err(IndexError::InvalidCardinality);
    }
    if config.workers == 0 {
        return Err(IndexError::InvalidWorkers);
    }

    graph
        .vertices()
        .into_iter()
        .map(|v| {
            let label = graph.label(v);
            match quotas.get(label) {
                Some(q) if q.is_finite() && q >= 0.0 => Ok(q),
                Some(q) => Err(IndexError::InvalidQuota {
                    vertex: label.to_string(),
                    value: q,
                }),
                None => Err(IndexError::QuotaMismatch {
                    missing: vec![label.to_string()],
                    extra: Vec::new(),
                }),
            }
        })
        .collect()
}

/// Combined weight of `members` toward `center`, or `None` if some member
/// has no edge in `direction`.
#[must_use]
pub fn set_weight<G: WeightedGraph>(
    graph: &G,
    center: G::Vertex,
    members: &[G::Vertex],
    direction: Direction,
    policy: ParallelEdgePolicy,
) -> Option<f64> {
    members
        .iter()
        .map(|&m| {
            let (from, to) = direction.orient(m, center);
            graph.edge_weight(from, to, policy)
        })
        .sum()
}

/// Raw score of one vertex.
#[allow(clippy::cast_precision_loss)]
fn score_vertex<G: WeightedGraph>(
    graph: &G,
    vertices: &[G::Vertex],
    v: G::Vertex,
    quota: f64,
    config: &BundleIndexConfig,
) -> Result<f64, TaskError> {
    if config.is_cancelled() {
        return Err(TaskError::Cancelled);
    }

    let candidates: Vec<G::Vertex> = vertices.iter().copied().filter(|&u| u != v).collect();
    let generator = SubsetGenerator::new(graph, v, config.k, config.direction);

    let mut weights: HashMap<G::Vertex, f64> = HashMap::new();
    for &u in &candidates {
        if !generator.is_adjacent(u) {
            continue;
        }
        let (from, to) = config.direction.orient(u, v);
        let w = graph
            .edge_weight(from, to, config.parallel_edges)
            .ok_or_else(|| TaskError::MissingWeight {
                vertex: graph.label(v).to_string(),
                member: graph.label(u).to_string(),
            })?;
        weights.insert(u, w);
    }

    let mut count: u64 = 0;
    let mut emitted: u64 = 0;
    let flow = generator.enumerate(&candidates, config.enumeration, |subset| {
        emitted += 1;
        if emitted % CANCEL_CHECK_INTERVAL == 0 && config.is_cancelled() {
            return ControlFlow::Break(TaskError::Cancelled);
        }

        let mut sum = 0.0;
        for u in subset {
            match weights.get(u) {
                Some(w) => sum += w,
                None => {
                    return ControlFlow::Break(TaskError::MissingWeight {
                        vertex: graph.label(v).to_string(),
                        member: graph.label(*u).to_string(),
                    });
                }
            }
        }
        if sum >= quota {
            count += 1;
        }
        ControlFlow::Continue(())
    });

    match flow {
        ControlFlow::Break(err) => Err(err),
        ControlFlow::Continue(()) => Ok(count as f64),
    }
}
