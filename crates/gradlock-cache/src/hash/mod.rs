//! File hashing utilities.
//!
//! Gradle's module cache is attested with sha256, so that is what local
//! content is hashed with. Files are streamed through the hasher rather
//! than read whole, and directories are hashed in parallel with a sorted
//! file list so the result order is deterministic.

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::CacheResult;
use gradlock_core::error::LockError;

/// Hex sha256 of an in-memory buffer.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Streaming sha256 of a single file, as a hex string.
pub fn hash_file(path: &Path) -> CacheResult<String> {
    let file = File::open(path)
        .map_err(|e| LockError::io(format!("failed to open {}", path.display()), e))?;
    let mut reader = io::BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| LockError::io(format!("failed to read {}", path.display()), e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash every regular file under a directory.
///
/// Returns `(file name, hex sha256)` pairs sorted by the full path, so two
/// runs over the same tree produce the same list. Hashing itself runs in
/// parallel.
pub fn hash_directory(dir: &Path) -> CacheResult<Vec<(String, String)>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| {
            entry
                .ok()
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
        })
        .collect();
    // Sort before hashing for deterministic output order.
    paths.sort();

    paths
        .par_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let hash = hash_file(path)?;
            Ok((name, hash))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_hash_file_streams() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib-1.0.jar");
        fs::write(&path, b"jar bytes").unwrap();

        let hash = hash_file(&path).unwrap();
        assert_eq!(hash, hex::encode(Sha256::digest(b"jar bytes")));
    }

    #[test]
    fn test_hash_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(hash_file(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_hash_directory_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.jar"), b"bb").unwrap();
        fs::write(dir.path().join("a.jar"), b"aa").unwrap();
        let sub = dir.path().join("sha");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("c.pom"), b"cc").unwrap();

        let first = hash_directory(dir.path()).unwrap();
        let second = hash_directory(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].0, "a.jar");
        assert_eq!(first[1].0, "b.jar");
    }
}
