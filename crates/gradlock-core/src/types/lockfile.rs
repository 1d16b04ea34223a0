//! Lockfile value types.
//!
//! The lockfile is a nested mapping from `"group:name"` to version key to
//! artifact file name to `{urls, hash}`. Maps are IndexMaps so the
//! serialized key order is exactly the insertion order; the merger inserts
//! in canonical order (modules ascending, versions descending, files
//! ascending) and serialization is deterministic with no further sorting.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The locked location and content hash of one artifact file.
///
/// Every URL in the list must yield content hashing to `hash` when fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub urls: Vec<String>,
    pub hash: String,
}

impl ArtifactFile {
    /// Build an artifact file entry, sorting and deduplicating the URLs.
    pub fn new(mut urls: Vec<String>, hash: impl Into<String>) -> Self {
        urls.sort();
        urls.dedup();
        Self {
            urls,
            hash: hash.into(),
        }
    }

    /// Union another URL set into this entry, keeping the list sorted and
    /// deduplicated.
    pub fn merge_urls(&mut self, urls: impl IntoIterator<Item = String>) {
        self.urls.extend(urls);
        self.urls.sort();
        self.urls.dedup();
    }
}

/// All locked versions of one module, keyed by version key, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Module {
    pub versions: IndexMap<String, IndexMap<String, ArtifactFile>>,
}

/// The complete lockfile: module id string to module, canonically ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lockfile {
    pub modules: IndexMap<String, Module>,
}

impl Lockfile {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Total number of locked artifact files.
    pub fn file_count(&self) -> usize {
        self.modules
            .values()
            .flat_map(|module| module.versions.values())
            .map(|files| files.len())
            .sum()
    }
}
