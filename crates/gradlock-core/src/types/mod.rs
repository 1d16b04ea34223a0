//! Core data types for the gradlock lockfile builder.

pub mod checksum;
pub mod lockfile;
pub mod module;
pub mod repository;
pub mod version;

pub use checksum::{Checksum, ChecksumKind};
pub use lockfile::{ArtifactFile, Lockfile, Module};
pub use module::{DependencyCoordinates, ModuleId, ModuleVersionId};
pub use repository::{Repository, RepositoryKind};
pub use version::{Version, VersionCache};
