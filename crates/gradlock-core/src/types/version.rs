//! Gradle-compatible version parsing and ordering.
//!
//! A version is its source string split into alternating numeric and
//! non-numeric tokens (on `.`, `_`, `-`, `+` and at digit/word boundaries).
//! Comparison follows Gradle's resolution engine: numeric tokens compare
//! numerically and always outrank word tokens at the same position, a fixed
//! rank table orders the special qualifiers (`dev` < plain < `rc` <
//! `snapshot` < `final` < `ga` < `release` < `sp`), and when one token
//! sequence is a strict prefix of the other the longer version is newer
//! unless its first extra token is a qualifier.

use dashmap::DashMap;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A parsed version string with Gradle ordering semantics.
///
/// Parsing never fails: any string is a valid version, the empty string
/// being the minimal one. Two versions with the same source string are
/// equal and comparison short-circuits.
#[derive(Debug, Clone)]
pub struct Version {
    source: String,
    parts: Vec<String>,
    numeric_parts: Vec<Option<u64>>,
}

impl Version {
    /// Parse a version from its source string.
    pub fn parse(source: &str) -> Self {
        let parts = split_parts(source);
        let numeric_parts = parts.iter().map(|p| p.parse::<u64>().ok()).collect();
        Self {
            source: source.to_string(),
            parts,
            numeric_parts,
        }
    }

    /// The original source string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The tokenized parts of the version.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    fn compare_parts(&self, other: &Self) -> Ordering {
        let common = self.parts.len().min(other.parts.len());
        for i in 0..common {
            let part1 = &self.parts[i];
            let part2 = &other.parts[i];
            if part1 == part2 {
                continue;
            }
            match (self.numeric_parts[i], other.numeric_parts[i]) {
                // A numeric token is newer than a word token at the same position.
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some(n1), Some(n2)) => match n1.cmp(&n2) {
                    Ordering::Equal => continue,
                    ord => return ord,
                },
                (None, None) => {
                    let rank1 = qualifier_rank(part1);
                    let rank2 = qualifier_rank(part2);
                    if rank1.is_some() || rank2.is_some() {
                        return rank1.unwrap_or(0).cmp(&rank2.unwrap_or(0));
                    }
                    return part1.cmp(part2);
                }
            }
        }
        // One sequence is a strict prefix of the other: the longer version is
        // newer unless its first extra token is a qualifier.
        if self.parts.len() > common {
            return if self.numeric_parts[common].is_some() {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        if other.parts.len() > common {
            return if other.numeric_parts[common].is_some() {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        Ordering::Equal
    }
}

/// Fixed ranks for qualifiers with special meaning; plain words rank 0.
fn qualifier_rank(part: &str) -> Option<i32> {
    match part.to_ascii_lowercase().as_str() {
        "dev" => Some(-1),
        "rc" => Some(1),
        "snapshot" => Some(2),
        "final" => Some(3),
        "ga" => Some(4),
        "release" => Some(5),
        "sp" => Some(6),
        _ => None,
    }
}

/// Split a version string on separators and digit/word boundaries.
fn split_parts(source: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut digit = false;
    let mut start = 0;
    for (pos, ch) in source.char_indices() {
        if matches!(ch, '.' | '_' | '-' | '+') {
            parts.push(source[start..pos].to_string());
            start = pos + ch.len_utf8();
            digit = false;
        } else if ch.is_ascii_digit() {
            if !digit && pos > start {
                parts.push(source[start..pos].to_string());
                start = pos;
            }
            digit = true;
        } else {
            if digit {
                parts.push(source[start..pos].to_string());
                start = pos;
            }
            digit = false;
        }
    }
    if source.len() > start {
        parts.push(source[start..].to_string());
    }
    parts
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.source == other.source {
            return Ordering::Equal;
        }
        // Distinct sources that tie part-wise ("1.0" vs "1-0") fall back to
        // source order, keeping Ord consistent with Eq.
        self.compare_parts(other)
            .then_with(|| self.source.cmp(&other.source))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for Version {
    fn from(source: &str) -> Self {
        Version::parse(source)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VersionVisitor;

        impl Visitor<'_> for VersionVisitor {
            type Value = Version;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a version string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Version, E> {
                Ok(Version::parse(value))
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

/// Interning cache for parsed versions, owned by a merge run.
///
/// Dependency graphs repeat the same version strings many times; the cache
/// parses each distinct string once. It is passed explicitly to the
/// components that need it so tests get a fresh cache and parallel workers
/// can share one without hidden global state.
#[derive(Debug, Default)]
pub struct VersionCache {
    inner: DashMap<String, Version>,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a version, reusing the cached result for a seen source string.
    pub fn parse(&self, source: &str) -> Version {
        if let Some(cached) = self.inner.get(source) {
            return cached.clone();
        }
        let version = Version::parse(source);
        self.inner.insert(source.to_string(), version.clone());
        version
    }

    /// Number of distinct version strings interned so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
