//! Input document parsing for gradlock.
//!
//! This crate reads the three documents a merge run consumes:
//! - the dependency graph JSON emitted by the build plugin,
//! - Gradle's `verification-metadata.xml` trust database,
//! - Gradle module descriptor (`.module`) files.

pub mod descriptor;
pub mod graph;
pub mod verification;

// Re-export main types
pub use descriptor::{GradleModule, Variant, VariantFile};
pub use graph::{
    ConfigurationTarget, DependencyGraph, DependencySource, ResolvedConfiguration,
    ResolvedDependency,
};
pub use verification::{
    ArtifactVerification, ComponentVerification, VerificationIndex, VerificationMetadata,
};

use gradlock_core::error::LockError;

/// Result type for document parsing operations
pub type ConfigResult<T> = Result<T, LockError>;
