//! Local trust sources for gradlock.
//!
//! The build tool leaves verified artifact content on disk: the module
//! cache under the Gradle user home, and (in test setups) a local mirror
//! standing in for the network. This crate hashes that content and exposes
//! the `ComponentVerifier`, the fallback chain deciding which trusted
//! checksums apply to a component.

pub mod hash;
pub mod verify;

// Re-export main types
pub use hash::{hash_directory, hash_file, sha256_hex};
pub use verify::ComponentVerifier;

use gradlock_core::error::LockError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, LockError>;
