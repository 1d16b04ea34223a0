//! Lockfile merge engine for gradlock.
//!
//! Takes one resolved dependency graph per constituent build, reconciles
//! every resolved module version against the verification tiers and the
//! repository layouts, and folds the results into one canonical lockfile.

pub mod merge;

// Re-export main types
pub use merge::{merge, merge_graphs, resolve_graph, MergeContext, ResolvedGraph};

use gradlock_core::error::LockError;

/// Result type for merge operations
pub type MergeResult<T> = Result<T, LockError>;
