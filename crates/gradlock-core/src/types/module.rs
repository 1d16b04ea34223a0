//! Module coordinates.
//!
//! `ModuleId` identifies a logical package irrespective of version;
//! `ModuleVersionId` pins one resolved instance, with an optional snapshot
//! timestamp disambiguating time-stamped publications that share a nominal
//! `-SNAPSHOT` version. `DependencyCoordinates` is the raw coordinate record
//! as it appears in the dependency graph document.

use crate::error::LockError;
use crate::types::version::Version;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A (group, name) pair identifying a logical module.
///
/// Ordered lexicographically by group, then name; serialized as
/// `"group:name"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for ModuleId {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(LockError::InvalidCoordinates {
                value: s.to_string(),
            });
        }
        Ok(ModuleId::new(parts[0], parts[1]))
    }
}

impl Serialize for ModuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ModuleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModuleIdVisitor;

        impl Visitor<'_> for ModuleIdVisitor {
            type Value = ModuleId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 'group:name' module id")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ModuleId, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ModuleIdVisitor)
    }
}

/// One resolved module instance: module id, version, and the snapshot
/// timestamp when the publication is time-stamped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleVersionId {
    pub module_id: ModuleId,
    pub version: Version,
    pub timestamp: Option<String>,
}

impl ModuleVersionId {
    pub fn new(module_id: ModuleId, version: Version, timestamp: Option<String>) -> Self {
        Self {
            module_id,
            version,
            timestamp,
        }
    }

    pub fn group(&self) -> &str {
        &self.module_id.group
    }

    pub fn name(&self) -> &str {
        &self.module_id.name
    }

    /// The key this version serializes under in the lockfile: the plain
    /// version string, or the `group:name:version:timestamp` long form when
    /// a timestamp disambiguates.
    pub fn version_key(&self) -> String {
        match &self.timestamp {
            Some(timestamp) => format!(
                "{}:{}:{}:{}",
                self.group(),
                self.name(),
                self.version,
                timestamp
            ),
            None => self.version.to_string(),
        }
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module_id, self.version)?;
        if let Some(timestamp) = &self.timestamp {
            write!(f, ":{}", timestamp)?;
        }
        Ok(())
    }
}

impl PartialOrd for ModuleVersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleVersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.module_id
            .cmp(&other.module_id)
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.timestamp.cmp(&other.timestamp))
    }
}

/// Raw module coordinates from the dependency graph document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyCoordinates {
    pub group: String,
    pub module: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl DependencyCoordinates {
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version: version.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(self.group.clone(), self.module.clone())
    }

    /// The version as it appears in artifact file names: for a time-stamped
    /// snapshot publication, `SNAPSHOT` is replaced by the timestamp.
    pub fn artifact_version(&self) -> String {
        match &self.timestamp {
            Some(timestamp) => self.version.replace("SNAPSHOT", timestamp),
            None => self.version.clone(),
        }
    }

    /// Parse `group:module:version[:timestamp]`.
    pub fn parse(s: &str) -> Result<Self, LockError> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, module, version] => Ok(Self::new(*group, *module, *version)),
            [group, module, version, timestamp] => {
                Ok(Self::new(*group, *module, *version).with_timestamp(*timestamp))
            }
            _ => Err(LockError::InvalidCoordinates {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DependencyCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)?;
        if let Some(timestamp) = &self.timestamp {
            write!(f, ":{}", timestamp)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_ordering() {
        let a = ModuleId::new("com.example", "alpha");
        let b = ModuleId::new("com.example", "beta");
        let c = ModuleId::new("org.example", "alpha");
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_module_id_round_trip() {
        let id: ModuleId = "com.example:lib".parse().unwrap();
        assert_eq!(id, ModuleId::new("com.example", "lib"));
        assert_eq!(id.to_string(), "com.example:lib");
    }

    #[test]
    fn test_module_id_rejects_malformed() {
        assert!("com.example".parse::<ModuleId>().is_err());
        assert!("a:b:c".parse::<ModuleId>().is_err());
        assert!(":lib".parse::<ModuleId>().is_err());
    }

    #[test]
    fn test_artifact_version_replaces_snapshot() {
        let coordinates = DependencyCoordinates::new("org.apache", "lib", "2.0-SNAPSHOT")
            .with_timestamp("20070310.181613-3");
        assert_eq!(coordinates.artifact_version(), "2.0-20070310.181613-3");

        let plain = DependencyCoordinates::new("org.apache", "lib", "2.0");
        assert_eq!(plain.artifact_version(), "2.0");
    }

    #[test]
    fn test_coordinates_parse() {
        let coordinates = DependencyCoordinates::parse("com.example:lib:1.0").unwrap();
        assert_eq!(coordinates.to_string(), "com.example:lib:1.0");

        let stamped =
            DependencyCoordinates::parse("com.example:lib:1.0-SNAPSHOT:20070310.181613-3").unwrap();
        assert_eq!(stamped.timestamp.as_deref(), Some("20070310.181613-3"));

        assert!(DependencyCoordinates::parse("com.example:lib").is_err());
    }

    #[test]
    fn test_version_key_long_form_only_with_timestamp() {
        let plain = ModuleVersionId::new(
            ModuleId::new("com.example", "lib"),
            Version::parse("1.0"),
            None,
        );
        assert_eq!(plain.version_key(), "1.0");

        let stamped = ModuleVersionId::new(
            ModuleId::new("com.example", "lib"),
            Version::parse("1.0-SNAPSHOT"),
            Some("20070310.181613-3".into()),
        );
        assert_eq!(
            stamped.version_key(),
            "com.example:lib:1.0-SNAPSHOT:20070310.181613-3"
        );
    }
}
