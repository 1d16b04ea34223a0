//! Dependency graph document.
//!
//! The build plugin records every resolved configuration as JSON: the
//! configuration's source, the repositories it resolved against, and a flat
//! list of resolved dependency edges. One document is produced per
//! constituent build (the root build, buildSrc, included builds); a merge
//! run consumes one or more of them.

use crate::ConfigResult;
use gradlock_core::error::LockError;
use gradlock_core::types::{DependencyCoordinates, Repository};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One build's resolved configurations.
pub type DependencyGraph = Vec<ResolvedConfiguration>;

/// Where a configuration was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationTarget {
    Gradle,
    Settings,
    Buildscript,
    Project,
}

/// The declaring location of a configuration or dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySource {
    pub target_type: ConfigurationTarget,
    pub target_path: String,
    pub build_path: String,
}

/// One resolved dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDependency {
    /// Coordinate string, unique within the configuration.
    pub id: String,
    pub source: DependencySource,
    /// Whether the dependency was requested directly rather than pulled in
    /// transitively.
    pub direct: bool,
    pub coordinates: DependencyCoordinates,
    /// Id of the repository the dependency resolved from. `None` marks a
    /// project-to-project edge, which never appears in the lockfile.
    #[serde(default)]
    pub repository: Option<String>,
    /// Ids of this dependency's own resolved dependencies.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// One resolved configuration with its repositories and dependency edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfiguration {
    pub root_source: DependencySource,
    pub configuration_name: String,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub all_dependencies: Vec<ResolvedDependency>,
}

/// Load a dependency graph document from disk.
pub fn load_dependency_graph(path: &Path) -> ConfigResult<DependencyGraph> {
    let file = File::open(path)
        .map_err(|e| LockError::io(format!("failed to open {}", path.display()), e))?;
    let graph = serde_json::from_reader(BufReader::new(file)).map_err(|e| LockError::GraphParse {
        message: format!("{}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;
    Ok(graph)
}

/// Parse a dependency graph document from a string.
pub fn parse_dependency_graph(input: &str) -> ConfigResult<DependencyGraph> {
    serde_json::from_str(input).map_err(|e| LockError::GraphParse {
        message: e.to_string(),
        source: Some(Box::new(e)),
    })
}
