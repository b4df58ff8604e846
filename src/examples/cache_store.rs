//! On-disk store of recorded example results.
//!
//! One JSON file per `(repository, cache key)` pair:
//! `<cache_root>/examples-cache/<slug>-<key>.json`. The store never fails a
//! load: a missing, unreadable or unparsable file is a miss, and the caller
//! falls back to running the examples.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{CacheKey, ExecutionResult};
use crate::constants::EXAMPLES_CACHE_DIR;
use crate::utils::atomic_write;

/// Reads and writes cached [`ExecutionResult`] sets.
#[derive(Debug, Clone)]
pub struct ExecutionCacheStore {
    dir: PathBuf,
}

impl ExecutionCacheStore {
    /// Creates a store rooted at `cache_root`.
    pub fn new(cache_root: impl AsRef<Path>) -> Self {
        Self {
            dir: cache_root.as_ref().join(EXAMPLES_CACHE_DIR),
        }
    }

    /// Directory holding the cache files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache file for a repository and key.
    #[must_use]
    pub fn path_for(&self, slug: &str, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{slug}-{key}.json"))
    }

    /// Loads the cached results, or `None` on any kind of miss.
    pub async fn load(&self, slug: &str, key: &CacheKey) -> Option<Vec<ExecutionResult>> {
        let path = self.path_for(slug, key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(target: "examples::cache", "Cache miss for '{}' ({})", slug, key);
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    target: "examples::cache",
                    "Ignoring unreadable cache file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_slice::<Vec<ExecutionResult>>(&bytes) {
            Ok(results) => {
                tracing::debug!(
                    target: "examples::cache",
                    "Cache hit for '{}' ({} results)",
                    slug,
                    results.len()
                );
                Some(results)
            }
            Err(e) => {
                tracing::warn!(
                    target: "examples::cache",
                    "Ignoring corrupt cache file {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Persists a result set, replacing any previous file for the same key.
    pub async fn store(&self, slug: &str, key: &CacheKey, results: &[ExecutionResult]) -> Result<()> {
        let path = self.path_for(slug, key);
        let payload = serde_json::to_vec(results).context("Failed to serialize example results")?;

        let target = path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&target, &payload))
            .await
            .context("Cache write task panicked")?
            .with_context(|| format!("Failed to write example cache: {}", path.display()))?;

        tracing::debug!(
            target: "examples::cache",
            "Stored {} results for '{}' at {}",
            results.len(),
            slug,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::examples::compute_cache_key;
    use tempfile::tempdir;

    fn sample_results() -> Vec<ExecutionResult> {
        vec![
            ExecutionResult {
                id: "basic".to_string(),
                source: "package main\n".to_string(),
                normalized: "package main".to_string(),
                stdout: "hello\n".to_string(),
                stderr: String::new(),
                exit_code: 0,
                duration_ms: 12,
            },
            ExecutionResult {
                id: "fails".to_string(),
                source: "package main".to_string(),
                normalized: "package main".to_string(),
                stdout: "panic: boom".to_string(),
                stderr: String::new(),
                exit_code: 2,
                duration_ms: 40,
            },
        ]
    }

    fn some_key(dir: &Path) -> CacheKey {
        compute_cache_key(&dir.join("examples"), dir, &[]).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip() {
        let temp = tempdir().unwrap();
        let store = ExecutionCacheStore::new(temp.path());
        let key = some_key(temp.path());

        store.store("str", &key, &sample_results()).await.unwrap();
        let loaded = store.load("str", &key).await.unwrap();
        assert_eq!(loaded, sample_results());
    }

    #[tokio::test]
    async fn test_unknown_key_is_miss() {
        let temp = tempdir().unwrap();
        let store = ExecutionCacheStore::new(temp.path());
        assert!(store.load("str", &some_key(temp.path())).await.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_namespaced_by_slug() {
        let temp = tempdir().unwrap();
        let store = ExecutionCacheStore::new(temp.path());
        let key = some_key(temp.path());

        store.store("str", &key, &sample_results()).await.unwrap();
        assert!(store.load("queue", &key).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_miss() {
        let temp = tempdir().unwrap();
        let store = ExecutionCacheStore::new(temp.path());
        let key = some_key(temp.path());
        let path = store.path_for("str", &key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        std::fs::write(&path, "{not json").unwrap();
        assert!(store.load("str", &key).await.is_none());

        // Legacy layout with different field names.
        std::fs::write(&path, r#"[{"ID":"basic","Code":"x"}]"#).unwrap();
        assert!(store.load("str", &key).await.is_none());
    }
}
