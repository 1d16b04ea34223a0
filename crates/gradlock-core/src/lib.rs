//! # gradlock-core
//!
//! Core types shared across all gradlock crates.
//!
//! This crate provides:
//! - Module coordinates and Gradle-compatible Version ordering
//! - Checksum kinds and SRI hash conversion
//! - Repository records with their resource pattern lists
//! - Lockfile value types with canonical serialization order
//! - LockError enum for unified error handling

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{LockError, LockResult};
pub use types::{
    ArtifactFile, Checksum, ChecksumKind, DependencyCoordinates, Lockfile, Module, ModuleId,
    ModuleVersionId, Repository, RepositoryKind, Version, VersionCache,
};
