//! Component verification fallback chain.
//!
//! The trusted checksums for a component come from the first source that
//! knows it:
//! 1. the verification metadata index (authoritative when present),
//! 2. the local Gradle module cache, whose content the build tool has
//!    already verified on download,
//! 3. a local test mirror standing in for the network, when configured.
//!
//! When none of these know the component, the merger's network
//! fetch-and-hash tier takes over.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::hash::hash_directory;
use gradlock_config::{ArtifactVerification, ComponentVerification, VerificationIndex};
use gradlock_core::types::{Checksum, ChecksumKind, ModuleVersionId};

/// Resolves trusted per-file checksums for components.
pub struct ComponentVerifier<'a> {
    index: &'a VerificationIndex,
    gradle_home: PathBuf,
    m2_override: Option<PathBuf>,
}

impl<'a> ComponentVerifier<'a> {
    pub fn new(
        index: &'a VerificationIndex,
        gradle_home: impl Into<PathBuf>,
        m2_override: Option<PathBuf>,
    ) -> Self {
        Self {
            index,
            gradle_home: gradle_home.into(),
            m2_override,
        }
    }

    /// Trusted checksums for a component, trying each source in order.
    ///
    /// The verification document always wins: a component it lists is never
    /// re-attested from local disk, even when the cached content differs.
    pub fn resolve(&self, id: &ModuleVersionId) -> Option<ComponentVerification> {
        if let Some(verification) = self.index.get(id) {
            return Some(verification.clone());
        }
        if let Some(verification) = self.from_directory(id, &self.module_cache_dir(id)) {
            info!("{id}: obtained artifact hashes from the Gradle module cache");
            return Some(verification);
        }
        if let Some(m2) = &self.m2_override {
            if let Some(verification) = self.from_directory(id, &Self::mirror_dir(m2, id)) {
                info!("{id}: obtained artifact hashes from the local mirror");
                return Some(verification);
            }
        }
        None
    }

    fn module_cache_dir(&self, id: &ModuleVersionId) -> PathBuf {
        self.gradle_home
            .join("caches/modules-2/files-2.1")
            .join(id.group())
            .join(id.name())
            .join(id.version.source())
    }

    fn mirror_dir(m2: &Path, id: &ModuleVersionId) -> PathBuf {
        let mut dir = m2.to_path_buf();
        for segment in id.group().split('.') {
            dir.push(segment);
        }
        dir.join(id.name()).join(id.version.source())
    }

    /// Synthesize a verification from the files found under a directory.
    fn from_directory(
        &self,
        id: &ModuleVersionId,
        dir: &Path,
    ) -> Option<ComponentVerification> {
        if !dir.is_dir() {
            return None;
        }
        let hashed = hash_directory(dir).ok()?;
        if hashed.is_empty() {
            return None;
        }
        let mut files: Vec<ArtifactVerification> = hashed
            .into_iter()
            .map(|(name, hash)| ArtifactVerification {
                name,
                checksums: vec![Checksum::new(ChecksumKind::Sha256, hash)],
            })
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files.dedup_by(|a, b| a.name == b.name);
        Some(ComponentVerification {
            id: id.clone(),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradlock_config::verification::{parse_verification_metadata, VerificationIndex};
    use gradlock_core::types::{ModuleId, Version, VersionCache};
    use sha2::Digest;
    use std::fs;

    fn id(group: &str, name: &str, version: &str) -> ModuleVersionId {
        ModuleVersionId::new(ModuleId::new(group, name), Version::parse(version), None)
    }

    fn empty_index() -> VerificationIndex {
        VerificationIndex::default()
    }

    #[test]
    fn test_unknown_component_resolves_to_none() {
        let index = empty_index();
        let home = tempfile::tempdir().unwrap();
        let verifier = ComponentVerifier::new(&index, home.path(), None);
        assert!(verifier.resolve(&id("com.example", "lib", "1.0")).is_none());
    }

    #[test]
    fn test_gradle_cache_synthesizes_sha256_verifications() {
        let index = empty_index();
        let home = tempfile::tempdir().unwrap();
        let module_dir = home
            .path()
            .join("caches/modules-2/files-2.1/com.example/lib/1.0");
        let hash_dir = module_dir.join("abc123");
        fs::create_dir_all(&hash_dir).unwrap();
        fs::write(hash_dir.join("lib-1.0.jar"), b"jar bytes").unwrap();
        fs::write(hash_dir.join("lib-1.0.pom"), b"<project/>").unwrap();

        let verifier = ComponentVerifier::new(&index, home.path(), None);
        let verification = verifier.resolve(&id("com.example", "lib", "1.0")).unwrap();
        assert_eq!(verification.files.len(), 2);
        assert_eq!(verification.files[0].name, "lib-1.0.jar");
        assert_eq!(verification.files[0].checksums[0].kind, ChecksumKind::Sha256);
        assert_eq!(
            verification.files[0].checksums[0].value,
            hex::encode(sha2::Sha256::digest(b"jar bytes"))
        );
    }

    #[test]
    fn test_mirror_fallback_uses_maven_layout() {
        let index = empty_index();
        let home = tempfile::tempdir().unwrap();
        let m2 = tempfile::tempdir().unwrap();
        let dir = m2.path().join("com/example/lib/1.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("lib-1.0.jar"), b"mirrored").unwrap();

        let verifier =
            ComponentVerifier::new(&index, home.path(), Some(m2.path().to_path_buf()));
        let verification = verifier.resolve(&id("com.example", "lib", "1.0")).unwrap();
        assert_eq!(verification.files.len(), 1);
        assert_eq!(verification.files[0].name, "lib-1.0.jar");
    }

    #[test]
    fn test_verification_document_wins_over_cache() {
        let metadata = parse_verification_metadata(
            r#"<verification-metadata>
                 <components>
                   <component group="com.example" name="lib" version="1.0">
                     <artifact name="lib-1.0.jar"><sha256 value="feed"/></artifact>
                   </component>
                 </components>
               </verification-metadata>"#,
        )
        .unwrap();
        let index = VerificationIndex::from_metadata(&metadata, &VersionCache::new());

        // The same component also sits in the cache with different content.
        let home = tempfile::tempdir().unwrap();
        let hash_dir = home
            .path()
            .join("caches/modules-2/files-2.1/com.example/lib/1.0/abc");
        fs::create_dir_all(&hash_dir).unwrap();
        fs::write(hash_dir.join("lib-1.0.jar"), b"different bytes").unwrap();

        let verifier = ComponentVerifier::new(&index, home.path(), None);
        let verification = verifier.resolve(&id("com.example", "lib", "1.0")).unwrap();
        assert_eq!(verification.files[0].checksums[0].value, "feed");
    }
}
