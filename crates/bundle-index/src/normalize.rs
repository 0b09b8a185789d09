//! Score normalization.
//!
//! Raw Bundle Index scores are counts. Normalizing divides each by the total
//! so the scores form a distribution over the vertex set. When every raw
//! score is zero there is nothing to distribute and each vertex gets `1/n`.

use std::collections::{BTreeSet, HashMap};

use bundle_core::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("raw scores do not match the vertex set (missing: {missing:?}, extra: {extra:?})")]
    KeyMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("cannot normalize scores of an empty graph")]
    EmptyGraph,
}

impl NormalizeError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::KeyMismatch { .. } => ErrorCode::ScoreKeyMismatch,
            Self::EmptyGraph => ErrorCode::EmptyGraph,
        }
    }
}

/// Replace raw counts with their share of the total.
///
/// The total is summed in `vertices` order, so the result does not depend on
/// the map's iteration order.
///
/// # Errors
///
/// [`NormalizeError::EmptyGraph`] when `vertices` is empty, and
/// [`NormalizeError::KeyMismatch`] when `raw` is keyed by a different set.
#[allow(clippy::cast_precision_loss, clippy::implicit_hasher)]
pub fn normalize_scores(
    vertices: &[String],
    raw: HashMap<String, f64>,
) -> Result<HashMap<String, f64>, NormalizeError> {
    if vertices.is_empty() {
        return Err(NormalizeError::EmptyGraph);
    }

    let expected: BTreeSet<&str> = vertices.iter().map(String::as_str).collect();
    let actual: BTreeSet<&str> = raw.keys().map(String::as_str).collect();
    if expected != actual {
        return Err(NormalizeError::KeyMismatch {
            missing: expected.difference(&actual).map(|s| (*s).to_string()).collect(),
            extra: actual.difference(&expected).map(|s| (*s).to_string()).collect(),
        });
    }

    let total: f64 = vertices.iter().filter_map(|v| raw.get(v)).sum();
    if total == 0.0 {
        let share = 1.0 / vertices.len() as f64;
        return Ok(vertices.iter().map(|v| (v.clone(), share)).collect());
    }

    Ok(raw.into_iter().map(|(v, s)| (v, s / total)).collect())
}
