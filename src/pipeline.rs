//! Documentation generation for a set of repositories.
//!
//! Each repository goes through the same steps:
//!
//! 1. sync a checkout ([`crate::source`])
//! 2. read its README
//! 3. obtain the example results, from cache or by running them
//!    ([`crate::examples`])
//! 4. transform the README ([`crate::markdown`]) and write the page
//!
//! Repositories run concurrently under `repo_concurrency` and fail
//! independently. Once all of them finished, the manifest records of the
//! successful ones are merged into the manifest in a single write.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{DocsConfig, RepoConfig, Toolchain};
use crate::core::DocsError;
use crate::examples::{ExampleBatch, ExampleRunner, ExecutionCacheStore, ExecutionCoordinator, ToolchainRunner};
use crate::manifest::{ExampleManifest, RepoRecords};
use crate::markdown::transform_document;
use crate::source::{RepoSync, sync_for};
use crate::utils::atomic_write;

/// Options of one `generate` run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Only generate this repository.
    pub repo: Option<String>,
    /// Ignore cached results and cached checkouts.
    pub fresh: bool,
}

/// What one successful repository produced.
#[derive(Debug, Clone)]
pub struct RepoOutcome {
    pub slug: String,
    pub output_path: PathBuf,
    /// Number of examples found in the checkout.
    pub examples: usize,
    /// Records of the examples embedded in the page.
    pub records: RepoRecords,
}

/// Result of a run over several repositories.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub succeeded: Vec<RepoOutcome>,
    pub failed: Vec<(String, anyhow::Error)>,
    /// Manifest file written, if any repository succeeded.
    pub manifest_path: Option<PathBuf>,
}

impl GenerationReport {
    /// Total repositories attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Turns a report with failures into [`DocsError::GenerationIncomplete`].
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(DocsError::GenerationIncomplete {
                failed: self.failed.len(),
                total: self.total(),
            }
            .into())
        }
    }
}

/// Builds the example runner for one checkout.
pub trait RunnerFactory: Send + Sync {
    type Runner: ExampleRunner;

    fn runner_for(&self, repo_root: &Path) -> Self::Runner;
}

/// Runs examples with the configured toolchain.
#[derive(Debug, Clone)]
pub struct ToolchainRunners {
    toolchain: Arc<Toolchain>,
    timeout: std::time::Duration,
}

impl ToolchainRunners {
    #[must_use]
    pub fn from_config(config: &DocsConfig) -> Self {
        Self {
            toolchain: Arc::new(config.toolchain.clone()),
            timeout: config.example_timeout(),
        }
    }
}

impl RunnerFactory for ToolchainRunners {
    type Runner = ToolchainRunner;

    fn runner_for(&self, repo_root: &Path) -> ToolchainRunner {
        ToolchainRunner::new(Arc::clone(&self.toolchain), repo_root, self.timeout)
    }
}

impl<F, R> RunnerFactory for F
where
    F: Fn(&Path) -> R + Send + Sync,
    R: ExampleRunner,
{
    type Runner = R;

    fn runner_for(&self, repo_root: &Path) -> R {
        self(repo_root)
    }
}

/// Drives generation for the repositories of a configuration.
pub struct Pipeline<F> {
    config: DocsConfig,
    toolchain: Arc<Toolchain>,
    store: ExecutionCacheStore,
    runners: F,
    progress: Option<ProgressBar>,
}

impl Pipeline<ToolchainRunners> {
    /// A pipeline that runs examples with the configured toolchain.
    #[must_use]
    pub fn new(config: DocsConfig) -> Self {
        let runners = ToolchainRunners::from_config(&config);
        Self::with_runners(config, runners)
    }
}

impl<F: RunnerFactory> Pipeline<F> {
    /// A pipeline with a custom runner factory.
    pub fn with_runners(config: DocsConfig, runners: F) -> Self {
        Self {
            toolchain: Arc::new(config.toolchain.clone()),
            store: ExecutionCacheStore::new(config.cache_root()),
            config,
            runners,
            progress: None,
        }
    }

    /// Advances `progress` once per finished repository.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub const fn config(&self) -> &DocsConfig {
        &self.config
    }

    /// Generates every selected repository and merges the manifest.
    ///
    /// Per-repository failures are collected in the report rather than
    /// returned; only selection errors and the manifest write fail the call.
    pub async fn generate(&self, options: &GenerateOptions) -> Result<GenerationReport> {
        let repos = self.config.select_repos(options.repo.as_deref())?;
        if let Some(slug) = &options.repo {
            tracing::info!(target: "pipeline", "Generating docs for filtered repo '{}'", slug);
        }
        if let Some(pb) = &self.progress {
            pb.set_length(repos.len() as u64);
        }

        let start = Instant::now();
        let outcomes: Vec<(String, Result<RepoOutcome>)> = stream::iter(repos)
            .map(|repo| async move {
                let result = self.generate_repo(&repo, options.fresh).await;
                if let Some(pb) = &self.progress {
                    pb.set_message(repo.slug.clone());
                    pb.inc(1);
                }
                (repo.slug, result)
            })
            .buffer_unordered(self.config.repo_concurrency.max(1))
            .collect()
            .await;

        let mut report = GenerationReport::default();
        for (slug, outcome) in outcomes {
            match outcome {
                Ok(done) => report.succeeded.push(done),
                Err(err) => {
                    tracing::error!(target: "pipeline", "Generation failed for '{}': {:#}", slug, err);
                    report.failed.push((slug, err));
                }
            }
        }
        report.succeeded.sort_by(|a, b| a.slug.cmp(&b.slug));
        report.failed.sort_by(|a, b| a.0.cmp(&b.0));

        if !report.succeeded.is_empty() {
            let updates: BTreeMap<String, RepoRecords> = report
                .succeeded
                .iter()
                .map(|outcome| (outcome.slug.clone(), outcome.records.clone()))
                .collect();
            let path = self.config.manifest_path();
            let write_path = path.clone();
            tokio::task::spawn_blocking(move || ExampleManifest::merge_into(&write_path, updates))
                .await
                .context("Manifest write task panicked")??;
            report.manifest_path = Some(path);
        }

        tracing::info!(
            target: "pipeline",
            "Generated {}/{} repositories in {:.2}s",
            report.succeeded.len(),
            report.total(),
            start.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    /// Generates one repository's page. Does not touch the manifest.
    pub async fn generate_repo(&self, repo: &RepoConfig, fresh: bool) -> Result<RepoOutcome> {
        let checkout_root = self.config.checkout_root();
        let checkout = sync_for(repo, &checkout_root, fresh)
            .sync(repo)
            .await
            .with_context(|| format!("Failed to sync '{}'", repo.slug))?;

        let readme_path = checkout.path.join(&repo.readme);
        let readme = tokio::fs::read_to_string(&readme_path).await.map_err(|e| DocsError::DocumentRead {
            path: readme_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let batch = ExampleBatch::new(
            repo.slug.as_str(),
            &checkout.path,
            Arc::clone(&self.toolchain),
            self.store.clone(),
        )
        .bypass_cache(fresh);
        let coordinator = ExecutionCoordinator::new(
            self.runners.runner_for(&checkout.path),
            self.config.example_concurrency,
        );
        let results = batch
            .run(&coordinator)
            .await
            .with_context(|| format!("Failed to run examples of '{}'", repo.slug))?;

        let document = transform_document(&readme, repo, &self.toolchain.language, &results);

        let output_path = self.config.docs_root.join(&repo.output_path);
        let target = output_path.clone();
        let content = document.content;
        tokio::task::spawn_blocking(move || atomic_write(&target, content.as_bytes()))
            .await
            .context("Document write task panicked")?
            .with_context(|| format!("Failed to write docs output for '{}'", repo.slug))?;

        tracing::info!(
            target: "pipeline",
            "Generated docs page for '{}' at {} ({} of {} examples embedded)",
            repo.slug,
            output_path.display(),
            document.records.len(),
            results.len()
        );

        Ok(RepoOutcome {
            slug: repo.slug.clone(),
            output_path,
            examples: results.len(),
            records: document.records,
        })
    }
}
