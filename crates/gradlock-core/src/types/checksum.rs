//! Checksum kinds and SRI conversion.
//!
//! A checksum records one trusted hash for an artifact file, possibly with
//! alternative values that are also trusted. Alternatives accommodate known
//! benign variance: metadata files (POMs in particular) often differ between
//! mirrors by line endings or a trailing newline without being compromised.

use crate::error::LockError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported checksum algorithms, weakest first so the derived ordering can
/// pick the strongest with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumKind {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl ChecksumKind {
    /// Canonical algorithm name as published in verification metadata.
    pub fn algorithm(&self) -> &'static str {
        match self {
            ChecksumKind::Md5 => "MD5",
            ChecksumKind::Sha1 => "SHA1",
            ChecksumKind::Sha256 => "SHA-256",
            ChecksumKind::Sha512 => "SHA-512",
        }
    }

    /// All kinds, most secure first.
    pub fn most_secure_first() -> [ChecksumKind; 4] {
        [
            ChecksumKind::Sha512,
            ChecksumKind::Sha256,
            ChecksumKind::Sha1,
            ChecksumKind::Md5,
        ]
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChecksumKind::Md5 => "md5",
            ChecksumKind::Sha1 => "sha1",
            ChecksumKind::Sha256 => "sha256",
            ChecksumKind::Sha512 => "sha512",
        };
        f.write_str(name)
    }
}

/// One trusted checksum for an artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub kind: ChecksumKind,
    /// Hex-encoded digest.
    pub value: String,
    /// Alternative hex digests that are also trusted for this file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    /// Where the checksum was found, for documentation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Checksum {
    pub fn new(kind: ChecksumKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            alternatives: Vec::new(),
            origin: None,
            reason: None,
        }
    }

    /// Convert to a subresource-integrity-style string:
    /// `<algorithm>-<base64 of the raw digest bytes>`.
    pub fn to_sri(&self) -> Result<String, LockError> {
        let bytes = hex::decode(&self.value).map_err(|_| LockError::InvalidChecksum {
            kind: self.kind.to_string(),
            value: self.value.clone(),
        })?;
        Ok(format!("{}-{}", self.kind, BASE64.encode(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_secure_first_order() {
        assert_eq!(
            ChecksumKind::most_secure_first(),
            [
                ChecksumKind::Sha512,
                ChecksumKind::Sha256,
                ChecksumKind::Sha1,
                ChecksumKind::Md5,
            ]
        );
        // Derived Ord agrees: sha512 is the maximum.
        assert!(ChecksumKind::Sha512 > ChecksumKind::Sha256);
        assert!(ChecksumKind::Sha256 > ChecksumKind::Sha1);
        assert!(ChecksumKind::Sha1 > ChecksumKind::Md5);
    }

    #[test]
    fn test_sri_known_answer() {
        // sha256 of the empty input.
        let checksum = Checksum::new(
            ChecksumKind::Sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        );
        assert_eq!(
            checksum.to_sri().unwrap(),
            "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn test_sri_rejects_malformed_hex() {
        let checksum = Checksum::new(ChecksumKind::Sha1, "not-hex");
        assert!(checksum.to_sri().is_err());
    }
}
