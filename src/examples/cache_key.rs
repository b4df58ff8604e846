//! Content-hash cache keys for recorded example output.
//!
//! The key covers every input that can change what an example prints:
//!
//! 1. the pipeline version marker
//! 2. every regular file below the examples directory, as
//!    `relative_path \0 bytes \0`, in sorted path order
//! 3. each configured dependency manifest found in the repository root, as
//!    `filename \0 bytes \0`, in configured order
//!
//! Inputs are hashed in sorted order, so directory enumeration order never
//! changes the key. File metadata (mtime, permissions) is not hashed.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use walkdir::WalkDir;

use crate::constants::{PIPELINE_VERSION_MARKER, TRANSIENT_FILE_PREFIX};
use crate::utils::normalize_path_for_storage;

/// Hex-encoded SHA-256 digest identifying one set of example inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The 64-character lowercase hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the cache key for an examples directory.
///
/// A missing examples directory or missing manifests contribute nothing.
/// Read errors on existing example files are propagated.
pub fn compute_cache_key(
    examples_dir: &Path,
    repo_root: &Path,
    dependency_manifests: &[String],
) -> Result<CacheKey> {
    let mut hasher = Sha256::new();
    hasher.update(PIPELINE_VERSION_MARKER.as_bytes());

    let mut files = Vec::new();
    if examples_dir.exists() {
        for entry in WalkDir::new(examples_dir).follow_links(false) {
            let entry = entry.with_context(|| {
                format!("Failed to walk examples directory: {}", examples_dir.display())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Leftovers of an interrupted run are not inputs.
            if entry.file_name().to_string_lossy().starts_with(TRANSIENT_FILE_PREFIX) {
                continue;
            }
            let relative = entry.path().strip_prefix(examples_dir).unwrap_or(entry.path());
            files.push((normalize_path_for_storage(relative), entry.path().to_path_buf()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    for (relative, path) in &files {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read example file for hashing: {}", path.display()))?;
        feed(&mut hasher, relative, &bytes);
    }

    for name in dependency_manifests {
        let path = repo_root.join(name);
        if let Ok(bytes) = std::fs::read(&path) {
            feed(&mut hasher, name, &bytes);
        }
    }

    let key = CacheKey(hex::encode(hasher.finalize()));
    tracing::debug!(
        target: "examples::cache",
        "Computed cache key {} over {} example files",
        key,
        files.len()
    );
    Ok(key)
}

fn feed(hasher: &mut Sha256, name: &str, bytes: &[u8]) {
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(bytes);
    hasher.update([0u8]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn manifests() -> Vec<String> {
        vec!["go.mod".to_string(), "go.sum".to_string()]
    }

    fn write_repo(root: &Path, files: &[(&str, &str)]) {
        for (path, content) in files {
            let full = root.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
    }

    fn key_of(root: &Path) -> CacheKey {
        compute_cache_key(&root.join("examples"), root, &manifests()).unwrap()
    }

    #[test]
    fn test_key_is_stable_and_hex() {
        let temp = tempdir().unwrap();
        write_repo(temp.path(), &[("examples/basic/main.go", "package main"), ("go.mod", "module x")]);

        let first = key_of(temp.path());
        let second = key_of(temp.path());
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_independent_of_creation_order() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let files = [
            ("examples/one/main.go", "1"),
            ("examples/two/main.go", "2"),
            ("examples/two/data.txt", "d"),
        ];
        write_repo(a.path(), &files);
        let mut reversed = files;
        reversed.reverse();
        write_repo(b.path(), &reversed);

        assert_eq!(key_of(a.path()), key_of(b.path()));
    }

    #[test]
    fn test_any_byte_change_changes_key() {
        let temp = tempdir().unwrap();
        write_repo(temp.path(), &[("examples/basic/main.go", "package main"), ("go.sum", "h1:a")]);
        let original = key_of(temp.path());

        write_repo(temp.path(), &[("examples/basic/main.go", "package mainX")]);
        let changed_example = key_of(temp.path());
        assert_ne!(original, changed_example);

        write_repo(temp.path(), &[("go.sum", "h1:b")]);
        assert_ne!(changed_example, key_of(temp.path()));
    }

    #[test]
    fn test_manifest_presence_changes_key() {
        let temp = tempdir().unwrap();
        write_repo(temp.path(), &[("examples/basic/main.go", "package main")]);
        let without = key_of(temp.path());
        write_repo(temp.path(), &[("go.mod", "")]);
        assert_ne!(without, key_of(temp.path()));
    }

    #[test]
    fn test_transient_files_are_ignored() {
        let temp = tempdir().unwrap();
        write_repo(temp.path(), &[("examples/basic/main.go", "package main")]);
        let clean = key_of(temp.path());

        write_repo(temp.path(), &[("examples/basic/livedocs_example_1234.go", "leftover")]);
        assert_eq!(clean, key_of(temp.path()));
    }

    #[test]
    fn test_moving_content_between_files_changes_key() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        write_repo(a.path(), &[("examples/x/main.go", "ab"), ("examples/y/main.go", "")]);
        write_repo(b.path(), &[("examples/x/main.go", "a"), ("examples/y/main.go", "b")]);
        assert_ne!(key_of(a.path()), key_of(b.path()));
    }

    #[test]
    fn test_missing_examples_dir_still_hashes_manifests() {
        let temp = tempdir().unwrap();
        let empty = key_of(temp.path());
        write_repo(temp.path(), &[("go.mod", "module x")]);
        assert_ne!(empty, key_of(temp.path()));
    }
}
