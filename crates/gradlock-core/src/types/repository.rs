//! Repository records.
//!
//! A repository is one dependency source together with its URL templating
//! conventions: ordered resource pattern lists for metadata and artifact
//! files, the metadata sources it declares, and whether it uses the Maven
//! directory layout (group segments as path components).

use serde::{Deserialize, Serialize};

/// Repository flavor as reported by the build tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepositoryKind {
    Maven,
    Ivy,
    FlatDir,
}

/// One dependency source with its resource layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RepositoryKind,
    /// Whether artifact paths use the Maven layout (dots in the group become
    /// path separators). Always true for Maven repositories; Ivy
    /// repositories may opt in.
    #[serde(default)]
    pub m2_compatible: bool,
    /// Metadata source names declared on the repository, drawn from
    /// `mavenPom`, `ivyDescriptor`, `gradleMetadata`,
    /// `ignoreGradleMetadataRedirection`.
    #[serde(default)]
    pub metadata_sources: Vec<String>,
    /// Ordered URL templates for metadata files.
    #[serde(default)]
    pub metadata_resources: Vec<String>,
    /// Ordered URL templates for artifact files.
    #[serde(default)]
    pub artifact_resources: Vec<String>,
}

impl Repository {
    /// Whether artifact paths follow the Maven directory layout.
    pub fn maven_layout(&self) -> bool {
        self.m2_compatible || self.kind == RepositoryKind::Maven
    }

    pub fn declares_metadata_source(&self, source: &str) -> bool {
        self.metadata_sources.iter().any(|s| s == source)
    }
}
