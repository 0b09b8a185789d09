//! Bundle Index centrality.
//!
//! ```text
//! WeightedGraph + QuotaTable
//!        ↓  index::BundleIndex::compute()   (rayon pool, one task per vertex)
//!        ↓    subsets::SubsetGenerator      (critical sets of size ≤ k)
//! raw counts
//!        ↓  normalize::normalize_scores()   (optional)
//! scores
//! ```

#![forbid(unsafe_code)]

pub mod index;
pub mod normalize;
pub mod subsets;

pub use index::{BundleIndex, BundleIndexConfig, CancelFlag, IndexError, TaskError, VertexFailure};
pub use normalize::{NormalizeError, normalize_scores};
pub use subsets::{CriticalSet, Enumeration, SubsetGenerator};
