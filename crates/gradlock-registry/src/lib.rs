//! Repository interaction for gradlock.
//!
//! This crate knows how repositories lay out their files:
//! - the resource-pattern templating engine (fill a template from module
//!   attributes, or match a concrete URL back into attributes),
//! - candidate URL computation for an artifact file across a repository's
//!   declared patterns, with metadata-source redirection,
//! - an HTTP client that fetches an artifact over its candidate URLs and
//!   hashes it on the fly when no local trust source can attest it.

pub mod client;
pub mod pattern;
pub mod urls;

// Re-export main types
pub use client::HttpClient;
pub use pattern::parse::{parse_artifact, parse_component};
pub use pattern::{fill, Attributes, MatcherCache, PatternMatcher, M2_PATTERN};
pub use urls::artifact_urls;

use gradlock_core::error::LockError;

/// Result type for repository operations
pub type RegistryResult<T> = Result<T, LockError>;
