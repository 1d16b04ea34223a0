//! Verification metadata document.
//!
//! Gradle's `gradle/verification-metadata.xml` is the trust database for a
//! build: per component, per artifact file, one or more expected checksums,
//! each possibly with alternative values that are also trusted. The reader
//! is deliberately forgiving: a build without (or with a broken) trust
//! database still produces a lockfile from the other verification tiers, so
//! a parse failure is a warning, not an error.

use crate::ConfigResult;
use gradlock_core::error::LockError;
use gradlock_core::types::{Checksum, ChecksumKind, ModuleId, ModuleVersionId, VersionCache};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Root of the verification metadata document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VerificationMetadata {
    #[serde(default)]
    pub configuration: Configuration,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    #[serde(default)]
    pub verify_metadata: Option<bool>,
    #[serde(default)]
    pub verify_signatures: Option<bool>,
    #[serde(default)]
    pub trusted_artifacts: TrustedArtifacts,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrustedArtifacts {
    #[serde(default, rename = "trust")]
    pub trusts: Vec<Trust>,
}

/// A trusted-artifact rule; any subset of the coordinates may be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trust {
    #[serde(default, rename = "@group")]
    pub group: Option<String>,
    #[serde(default, rename = "@name")]
    pub name: Option<String>,
    #[serde(default, rename = "@version")]
    pub version: Option<String>,
    #[serde(default, rename = "@file")]
    pub file: Option<String>,
    #[serde(default, rename = "@regex")]
    pub regex: bool,
    #[serde(default, rename = "@reason")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default, rename = "component")]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    #[serde(rename = "@group")]
    pub group: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(default, rename = "@timestamp")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "artifact")]
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(default)]
    pub md5: Option<ChecksumElement>,
    #[serde(default)]
    pub sha1: Option<ChecksumElement>,
    #[serde(default)]
    pub sha256: Option<ChecksumElement>,
    #[serde(default)]
    pub sha512: Option<ChecksumElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChecksumElement {
    #[serde(rename = "@value")]
    pub value: String,
    #[serde(default, rename = "@origin")]
    pub origin: Option<String>,
    #[serde(default, rename = "@reason")]
    pub reason: Option<String>,
    #[serde(default, rename = "also-trust")]
    pub also_trust: Vec<AlsoTrust>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlsoTrust {
    #[serde(rename = "@value")]
    pub value: String,
}

impl Artifact {
    /// The artifact's checksums, most secure algorithm first.
    pub fn checksums(&self) -> Vec<Checksum> {
        let mut checksums = Vec::new();
        for (kind, element) in [
            (ChecksumKind::Sha512, &self.sha512),
            (ChecksumKind::Sha256, &self.sha256),
            (ChecksumKind::Sha1, &self.sha1),
            (ChecksumKind::Md5, &self.md5),
        ] {
            if let Some(element) = element {
                checksums.push(Checksum {
                    kind,
                    value: element.value.clone(),
                    alternatives: element.also_trust.iter().map(|a| a.value.clone()).collect(),
                    origin: element.origin.clone(),
                    reason: element.reason.clone(),
                });
            }
        }
        checksums
    }
}

/// Parse the verification metadata document from a string.
pub fn parse_verification_metadata(input: &str) -> ConfigResult<VerificationMetadata> {
    quick_xml::de::from_str(input).map_err(|e| LockError::MetadataParse {
        message: e.to_string(),
    })
}

/// Read the verification metadata file, treating any failure as absence.
///
/// A missing file is normal (not every build checks in a trust database);
/// a malformed one is reported and ignored so the remaining verification
/// tiers can still produce a lockfile.
pub fn read_verification_metadata(path: &Path) -> Option<VerificationMetadata> {
    if !path.exists() {
        return None;
    }
    let input = match fs::read_to_string(path) {
        Ok(input) => input,
        Err(e) => {
            warn!("{}: failed to read verification metadata: {e}", path.display());
            return None;
        }
    };
    match parse_verification_metadata(&input) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!("{}: {e}; continuing without a trust database", path.display());
            None
        }
    }
}

/// Trusted per-file checksums for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentVerification {
    pub id: ModuleVersionId,
    /// Verified files, sorted by file name.
    pub files: Vec<ArtifactVerification>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactVerification {
    pub name: String,
    /// Checksums, most secure algorithm first.
    pub checksums: Vec<Checksum>,
}

/// In-memory index over the verification document, keyed by component.
#[derive(Debug, Default)]
pub struct VerificationIndex {
    by_component: HashMap<ModuleVersionId, ComponentVerification>,
}

impl VerificationIndex {
    /// Build the index from a parsed document. Files are sorted by name so
    /// downstream iteration is deterministic.
    pub fn from_metadata(metadata: &VerificationMetadata, versions: &VersionCache) -> Self {
        let mut by_component = HashMap::new();
        for component in &metadata.components.components {
            let id = ModuleVersionId::new(
                ModuleId::new(component.group.clone(), component.name.clone()),
                versions.parse(&component.version),
                component.timestamp.clone(),
            );
            let mut files: Vec<ArtifactVerification> = component
                .artifacts
                .iter()
                .map(|artifact| ArtifactVerification {
                    name: artifact.name.clone(),
                    checksums: artifact.checksums(),
                })
                .collect();
            files.sort_by(|a, b| a.name.cmp(&b.name));
            by_component.insert(
                id.clone(),
                ComponentVerification { id, files },
            );
        }
        Self { by_component }
    }

    pub fn get(&self, id: &ModuleVersionId) -> Option<&ComponentVerification> {
        self.by_component.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_component.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_component.is_empty()
    }
}
