//! Bounded parallel execution of a repository's examples.
//!
//! [`ExecutionCoordinator`] fans units out to an [`ExampleRunner`] with at most
//! `concurrency` jobs in flight and returns results sorted by id, so the output
//! never depends on completion order.
//!
//! [`ExampleBatch`] wraps the coordinator with discovery and the execution
//! cache: a hit skips execution entirely, and a result set is only written
//! back after every job in the batch succeeded.
//!
//! # Failure semantics
//!
//! The first failing job marks the batch as failed. Jobs that already started
//! run to completion, jobs that have not started yet are skipped, and all
//! results are discarded. The error names the first example whose job failed.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::{
    ExampleRunner, ExampleUnit, ExecutionCacheStore, ExecutionResult, compute_cache_key,
    discover_examples,
};
use crate::config::Toolchain;
use crate::core::DocsError;

/// Runs many examples with a fixed upper bound on concurrent jobs.
#[derive(Debug)]
pub struct ExecutionCoordinator<R> {
    runner: R,
    concurrency: usize,
}

impl<R: ExampleRunner> ExecutionCoordinator<R> {
    /// Creates a coordinator. A `concurrency` of zero is treated as one.
    pub fn new(runner: R, concurrency: usize) -> Self {
        Self {
            runner,
            concurrency: concurrency.max(1),
        }
    }

    /// The wrapped runner.
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Executes every unit and returns the results sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::BatchFailed`] wrapping the first job error in
    /// completion order.
    pub async fn execute(&self, slug: &str, units: Vec<ExampleUnit>) -> Result<Vec<ExecutionResult>> {
        let total = units.len();
        let failed = AtomicBool::new(false);

        let mut jobs = stream::iter(units)
            .map(|unit| {
                let runner = &self.runner;
                let failed = &failed;
                async move {
                    if failed.load(Ordering::Acquire) {
                        tracing::debug!(
                            target: "examples",
                            "({}) Skipped, batch already failed",
                            unit.id
                        );
                        return Ok(None);
                    }
                    match runner.run(&unit).await {
                        Ok(result) => Ok(Some(result)),
                        Err(err) => {
                            failed.store(true, Ordering::Release);
                            Err((unit.id, err))
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency);

        let mut results = Vec::with_capacity(total);
        let mut first_error: Option<(String, anyhow::Error)> = None;
        while let Some(outcome) = jobs.next().await {
            match outcome {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err((id, err)) => {
                    tracing::warn!(target: "examples", "({}) Example job failed: {:#}", id, err);
                    if first_error.is_none() {
                        first_error = Some((id, err));
                    }
                }
            }
        }

        if let Some((example, err)) = first_error {
            let reason = format!("{err:#}");
            return Err(err.context(DocsError::BatchFailed {
                slug: slug.to_string(),
                example,
                reason,
            }));
        }

        results.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(results)
    }
}

/// One repository's examples: discovery, cache lookup, execution, cache write.
#[derive(Debug, Clone)]
pub struct ExampleBatch {
    slug: String,
    repo_root: PathBuf,
    toolchain: Arc<Toolchain>,
    store: ExecutionCacheStore,
    bypass_cache: bool,
}

impl ExampleBatch {
    /// Creates a batch for the checkout at `repo_root`.
    pub fn new(
        slug: impl Into<String>,
        repo_root: impl Into<PathBuf>,
        toolchain: Arc<Toolchain>,
        store: ExecutionCacheStore,
    ) -> Self {
        Self {
            slug: slug.into(),
            repo_root: repo_root.into(),
            toolchain,
            store,
            bypass_cache: false,
        }
    }

    /// Skips the cache load so every example runs again. The result set is
    /// still stored afterwards.
    #[must_use]
    pub const fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Directory searched for examples.
    #[must_use]
    pub fn examples_dir(&self) -> PathBuf {
        self.repo_root.join(&self.toolchain.examples_dir)
    }

    /// Repository root of the batch.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Produces the sorted result set, from the cache when possible.
    pub async fn run<R: ExampleRunner>(
        &self,
        coordinator: &ExecutionCoordinator<R>,
    ) -> Result<Vec<ExecutionResult>> {
        let examples_dir = self.examples_dir();
        let entry_point = self.toolchain.entry_point.clone();
        let walk_dir = examples_dir.clone();
        let units = tokio::task::spawn_blocking(move || discover_examples(&walk_dir, &entry_point))
            .await
            .context("Example discovery task panicked")??;

        tracing::debug!(
            target: "examples",
            "Discovered {} examples for '{}' in {}",
            units.len(),
            self.slug,
            examples_dir.display()
        );

        let key = {
            let examples_dir = examples_dir.clone();
            let repo_root = self.repo_root.clone();
            let manifests = self.toolchain.dependency_manifests.clone();
            tokio::task::spawn_blocking(move || compute_cache_key(&examples_dir, &repo_root, &manifests))
                .await
                .context("Cache key task panicked")?
                .with_context(|| format!("Failed to compute cache key for '{}'", self.slug))?
        };

        if self.bypass_cache {
            tracing::debug!(target: "examples::cache", "Cache bypassed for '{}'", self.slug);
        } else if let Some(results) = self.store.load(&self.slug, &key).await {
            tracing::info!(
                target: "examples",
                "Using {} cached example results for '{}'",
                results.len(),
                self.slug
            );
            return Ok(results);
        }

        if units.is_empty() {
            tracing::info!(target: "examples", "No examples found for '{}'", self.slug);
        }

        let start = Instant::now();
        let results = coordinator.execute(&self.slug, units).await?;
        tracing::info!(
            target: "examples",
            "Executed {} examples for '{}' in {:.2}s",
            results.len(),
            self.slug,
            start.elapsed().as_secs_f64()
        );

        self.store.store(&self.slug, &key, &results).await?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedRunner, write_example};
    use std::time::Duration;
    use tempfile::tempdir;

    fn units(ids: &[&str]) -> Vec<ExampleUnit> {
        ids.iter()
            .map(|id| ExampleUnit::new(*id, format!("/examples/{id}/main.go"), format!("package main // {id}")))
            .collect()
    }

    #[tokio::test]
    async fn test_results_sorted_despite_jitter() {
        let runner = ScriptedRunner::new()
            .with_delay("alpha", Duration::from_millis(80))
            .with_delay("bravo", Duration::from_millis(5))
            .with_delay("charlie", Duration::from_millis(40));
        let coordinator = ExecutionCoordinator::new(runner, 3);

        let results = coordinator.execute("repo", units(&["charlie", "alpha", "bravo"])).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "bravo", "charlie"]);
        assert_eq!(coordinator.runner().calls(), 3);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut runner = ScriptedRunner::new();
        for id in ["a", "b", "c", "d", "e", "f"] {
            runner = runner.with_delay(id, Duration::from_millis(20));
        }
        let coordinator = ExecutionCoordinator::new(runner, 2);

        coordinator.execute("repo", units(&["a", "b", "c", "d", "e", "f"])).await.unwrap();
        assert_eq!(coordinator.runner().max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_batch() {
        let runner = ScriptedRunner::new().failing_on("bravo");
        let coordinator = ExecutionCoordinator::new(runner, 1);

        let err = coordinator.execute("repo", units(&["alpha", "bravo", "charlie"])).await.unwrap_err();
        match err.downcast_ref::<DocsError>() {
            Some(DocsError::BatchFailed {
                slug,
                example,
                ..
            }) => {
                assert_eq!(slug, "repo");
                assert_eq!(example, "bravo");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // With one worker the job after the failure never starts.
        assert_eq!(coordinator.runner().calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let coordinator = ExecutionCoordinator::new(ScriptedRunner::new(), 4);
        assert!(coordinator.execute("repo", Vec::new()).await.unwrap().is_empty());
    }

    fn batch_fixture(root: &Path) -> (ExampleBatch, ExecutionCacheStore) {
        let repo = root.join("repo");
        write_example(&repo, "basic", "package main\n\nfunc main() { println(\"hi\") }\n");
        write_example(&repo, "second", "package main\n\nfunc main() {}\n");
        let store = ExecutionCacheStore::new(root.join("cache"));
        let batch = ExampleBatch::new("repo", &repo, Arc::new(Toolchain::default()), store.clone());
        (batch, store)
    }

    #[tokio::test]
    async fn test_batch_stores_then_hits_cache() {
        let temp = tempdir().unwrap();
        let (batch, _store) = batch_fixture(temp.path());
        let coordinator = ExecutionCoordinator::new(ScriptedRunner::new(), 4);

        let first = batch.run(&coordinator).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(coordinator.runner().calls(), 2);

        let second = batch.run(&coordinator).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(coordinator.runner().calls(), 2, "cache hit must not run examples");
    }

    #[tokio::test]
    async fn test_bypass_skips_load_but_stores() {
        let temp = tempdir().unwrap();
        let (batch, store) = batch_fixture(temp.path());
        let coordinator = ExecutionCoordinator::new(ScriptedRunner::new(), 4);

        batch.run(&coordinator).await.unwrap();
        let fresh = batch.clone().bypass_cache(true);
        fresh.run(&coordinator).await.unwrap();
        assert_eq!(coordinator.runner().calls(), 4);

        let files: Vec<_> = std::fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_writes_no_cache() {
        let temp = tempdir().unwrap();
        let (batch, store) = batch_fixture(temp.path());
        let coordinator = ExecutionCoordinator::new(ScriptedRunner::new().failing_on("second"), 4);

        assert!(batch.run(&coordinator).await.is_err());
        assert!(!store.dir().exists() || std::fs::read_dir(store.dir()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_missing_examples_dir_yields_empty_set() {
        let temp = tempdir().unwrap();
        let store = ExecutionCacheStore::new(temp.path().join("cache"));
        let batch = ExampleBatch::new("empty", temp.path(), Arc::new(Toolchain::default()), store);
        let coordinator = ExecutionCoordinator::new(ScriptedRunner::new(), 4);

        assert!(batch.run(&coordinator).await.unwrap().is_empty());
    }
}
