//! Error types and result aliases for gradlock operations.
//!
//! Provides a unified error type covering all error conditions across the
//! gradlock crates. Only `HashConflict` is fatal to a merge run; every other
//! condition degrades with a warning at the call site.

use thiserror::Error;

/// Unified error type for all gradlock operations
#[derive(Error, Debug)]
pub enum LockError {
    // Merge errors
    #[error(
        "hash conflict for {artifact} file '{file}': {existing} != {conflicting}; \
         two builds resolved the same artifact with different content"
    )]
    HashConflict {
        artifact: String,
        file: String,
        existing: String,
        conflicting: String,
    },

    #[error("no trusted hash available for {artifact} file '{file}'")]
    UnverifiableArtifact { artifact: String, file: String },

    // Coordinate errors
    #[error("invalid module coordinates: '{value}'")]
    InvalidCoordinates { value: String },

    #[error("invalid {kind} checksum value '{value}'")]
    InvalidChecksum { kind: String, value: String },

    #[error("invalid resource pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    // Document errors
    #[error("failed to parse dependency graph: {message}")]
    GraphParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("failed to parse verification metadata: {message}")]
    MetadataParse { message: String },

    // Network errors
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("all candidate urls failed for {artifact} file '{file}'")]
    AllUrlsFailed { artifact: String, file: String },

    // IO errors
    #[error("io error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for gradlock operations
pub type LockResult<T> = Result<T, LockError>;

impl LockError {
    /// Create a network error from any error type
    pub fn network<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Whether this error must abort a merge run.
    ///
    /// Everything except a hash conflict is a per-artifact anomaly that the
    /// merger reports and skips.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LockError::HashConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_hash_conflict_is_fatal() {
        let conflict = LockError::HashConflict {
            artifact: "com.example:lib:1.0".into(),
            file: "lib-1.0.jar".into(),
            existing: "sha256-aaa".into(),
            conflicting: "sha256-bbb".into(),
        };
        assert!(conflict.is_fatal());

        let unverifiable = LockError::UnverifiableArtifact {
            artifact: "com.example:lib:1.0".into(),
            file: "lib-1.0.jar".into(),
        };
        assert!(!unverifiable.is_fatal());

        let network = LockError::Network {
            message: "connection refused".into(),
            source: None,
        };
        assert!(!network.is_fatal());
    }

    #[test]
    fn test_hash_conflict_message_includes_both_hashes() {
        let conflict = LockError::HashConflict {
            artifact: "com.example:lib:1.0".into(),
            file: "lib-1.0.jar".into(),
            existing: "sha256-aaa".into(),
            conflicting: "sha256-bbb".into(),
        };
        let message = conflict.to_string();
        assert!(message.contains("sha256-aaa"));
        assert!(message.contains("sha256-bbb"));
        assert!(message.contains("lib-1.0.jar"));
    }
}
