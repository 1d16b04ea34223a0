//! Gradle module descriptor documents.
//!
//! A `.module` file is richer metadata than a POM: it enumerates variants,
//! each with concrete files carrying a name, a repository-relative url, and
//! checksums. gradlock consults it for one thing only: discovering that
//! the repository stores a requested file under a different name than the
//! nominal artifact file name.

use crate::ConfigResult;
use gradlock_core::error::LockError;
use serde::Deserialize;

/// A parsed module descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradleModule {
    pub format_version: String,
    #[serde(default)]
    pub component: Option<Component>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    pub group: String,
    pub module: String,
    pub version: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub files: Vec<VariantFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantFile {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub sha512: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
}

impl GradleModule {
    /// The repository-internal url for a named file, when any variant lists
    /// it. This is how on-repository renames surface: the file's `url`
    /// differs from its `name`.
    pub fn file_url(&self, name: &str) -> Option<&str> {
        self.variants
            .iter()
            .flat_map(|variant| variant.files.iter())
            .find(|file| file.name == name)
            .map(|file| file.url.as_str())
    }
}

/// Parse a module descriptor from its JSON text.
pub fn parse_module_descriptor(input: &str) -> ConfigResult<GradleModule> {
    serde_json::from_str(input).map_err(|e| LockError::GraphParse {
        message: format!("module descriptor: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"{
      "formatVersion": "1.1",
      "component": {"group": "com.example", "module": "lib", "version": "1.0"},
      "variants": [
        {
          "name": "apiElements",
          "files": [
            {"name": "lib-1.0.jar", "url": "lib-1.0-renamed.jar", "size": 1024, "sha256": "aa11"}
          ]
        },
        {
          "name": "sourcesElements",
          "files": [
            {"name": "lib-1.0-sources.jar", "url": "lib-1.0-sources.jar", "size": 2048}
          ]
        }
      ]
    }"#;

    #[test]
    fn test_parses_descriptor() {
        let descriptor = parse_module_descriptor(DESCRIPTOR).unwrap();
        assert_eq!(descriptor.format_version, "1.1");
        assert_eq!(descriptor.variants.len(), 2);
    }

    #[test]
    fn test_file_url_finds_renames() {
        let descriptor = parse_module_descriptor(DESCRIPTOR).unwrap();
        assert_eq!(
            descriptor.file_url("lib-1.0.jar"),
            Some("lib-1.0-renamed.jar")
        );
        assert_eq!(
            descriptor.file_url("lib-1.0-sources.jar"),
            Some("lib-1.0-sources.jar")
        );
        assert_eq!(descriptor.file_url("lib-1.0.pom"), None);
    }
}
