//! Configuration for a documentation generation run.
//!
//! Configuration is an explicit value: [`DocsConfig`] is loaded once by the
//! CLI and handed to each component at construction. No component reads
//! environment variables on its own; the single manifest override is resolved
//! in [`DocsConfig::resolve_paths`].
//!
//! # File format
//!
//! ```toml
//! docs_root = "docs"
//! example_concurrency = 10
//! repo_concurrency = 4
//!
//! [toolchain]
//! program = "go"
//!
//! [[repos]]
//! slug = "str"
//! title = "Strings"
//! source_url = "https://github.com/goforj/str.git"
//! output_path = "libraries/strings.md"
//! ```

mod repo;
mod toolchain;

pub use repo::RepoConfig;
pub use toolchain::Toolchain;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    APP_TEMP_DIR, DEFAULT_EXAMPLE_CONCURRENCY, DEFAULT_EXAMPLE_TIMEOUT_SECS,
    DEFAULT_REPO_CONCURRENCY, MANIFEST_PATH_ENV,
};
use crate::core::DocsError;

fn app_temp_root() -> PathBuf {
    std::env::temp_dir().join(APP_TEMP_DIR)
}

fn default_docs_root() -> PathBuf {
    PathBuf::from("docs")
}

const fn default_example_concurrency() -> usize {
    DEFAULT_EXAMPLE_CONCURRENCY
}

const fn default_repo_concurrency() -> usize {
    DEFAULT_REPO_CONCURRENCY
}

const fn default_example_timeout_secs() -> u64 {
    DEFAULT_EXAMPLE_TIMEOUT_SECS
}

/// Top-level configuration of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Root directory rendered documents are written under.
    #[serde(default = "default_docs_root")]
    pub docs_root: PathBuf,

    /// Directory synced checkouts are placed in (`<checkout_root>/<slug>`).
    #[serde(default)]
    pub checkout_root: Option<PathBuf>,

    /// Root of the execution cache (`<cache_root>/examples-cache/...`).
    #[serde(default)]
    pub cache_root: Option<PathBuf>,

    /// Location of the examples manifest read by the serving layer.
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,

    /// Bound on concurrently running examples within one repository.
    #[serde(default = "default_example_concurrency")]
    pub example_concurrency: usize,

    /// Bound on repositories generated concurrently.
    #[serde(default = "default_repo_concurrency")]
    pub repo_concurrency: usize,

    /// Wall-clock limit for one example run.
    #[serde(default = "default_example_timeout_secs")]
    pub example_timeout_secs: u64,

    /// Toolchain used to run examples.
    #[serde(default)]
    pub toolchain: Toolchain,

    /// Repositories to generate.
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            docs_root: default_docs_root(),
            checkout_root: None,
            cache_root: None,
            manifest_path: None,
            example_concurrency: DEFAULT_EXAMPLE_CONCURRENCY,
            repo_concurrency: DEFAULT_REPO_CONCURRENCY,
            example_timeout_secs: DEFAULT_EXAMPLE_TIMEOUT_SECS,
            toolchain: Toolchain::default(),
            repos: Vec::new(),
        }
    }
}

impl DocsConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            anyhow::Error::from(DocsError::ConfigParse {
                file: origin.display().to_string(),
                reason: e.to_string(),
            })
        })
    }

    /// Loads and resolves the configuration file at `path`.
    ///
    /// Relative directories in the file are resolved against the file's parent
    /// directory. The manifest override is read from the environment here and
    /// nowhere else.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let mut config = Self::from_toml_str(&content, path)?;

        let base = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        config.rebase(base);
        config.resolve_paths(std::env::var_os(MANIFEST_PATH_ENV));
        config.validate()?;

        tracing::debug!(
            target: "config",
            "Loaded configuration from {} ({} repositories)",
            path.display(),
            config.repos.len()
        );
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.docs_root);
        for dir in [&mut self.checkout_root, &mut self.cache_root, &mut self.manifest_path]
            .into_iter()
            .flatten()
        {
            join(dir);
        }
        for repo in &mut self.repos {
            if let Some(local) = repo.local_path.as_mut() {
                join(local);
            }
        }
    }

    /// Fills every unset location with its default.
    ///
    /// `manifest_override` is the value of the manifest environment variable,
    /// passed in explicitly; a non-empty value wins over the file setting.
    pub fn resolve_paths(&mut self, manifest_override: Option<OsString>) {
        if let Some(value) = manifest_override.filter(|v| !v.is_empty()) {
            self.manifest_path = Some(PathBuf::from(value));
        }
        if self.manifest_path.is_none() {
            self.manifest_path = Some(app_temp_root().join("examples.json"));
        }
        if self.cache_root.is_none() {
            self.cache_root = Some(app_temp_root());
        }
        if self.checkout_root.is_none() {
            self.checkout_root = Some(app_temp_root().join("repos"));
        }
    }

    /// Rejects configurations the pipeline cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.example_concurrency == 0 || self.repo_concurrency == 0 {
            return Err(DocsError::ConfigParse {
                file: "configuration".to_string(),
                reason: "concurrency bounds must be at least 1".to_string(),
            }
            .into());
        }
        let mut seen = std::collections::HashSet::new();
        for repo in &self.repos {
            if !seen.insert(repo.slug.as_str()) {
                return Err(DocsError::ConfigParse {
                    file: "configuration".to_string(),
                    reason: format!("repository slug '{}' is listed twice", repo.slug),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Returns the configured repositories, optionally filtered to one slug.
    pub fn select_repos(&self, filter: Option<&str>) -> Result<Vec<RepoConfig>, DocsError> {
        if self.repos.is_empty() {
            return Err(DocsError::NoRepositories);
        }
        match filter {
            None => Ok(self.repos.clone()),
            Some(slug) => self
                .repos
                .iter()
                .find(|r| r.slug == slug)
                .map(|r| vec![r.clone()])
                .ok_or_else(|| DocsError::UnknownRepo {
                    slug: slug.to_string(),
                }),
        }
    }

    /// Manifest location after [`resolve_paths`](Self::resolve_paths).
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path.clone().unwrap_or_else(|| app_temp_root().join("examples.json"))
    }

    /// Cache root after [`resolve_paths`](Self::resolve_paths).
    #[must_use]
    pub fn cache_root(&self) -> PathBuf {
        self.cache_root.clone().unwrap_or_else(app_temp_root)
    }

    /// Checkout root after [`resolve_paths`](Self::resolve_paths).
    #[must_use]
    pub fn checkout_root(&self) -> PathBuf {
        self.checkout_root.clone().unwrap_or_else(|| app_temp_root().join("repos"))
    }

    /// Per-example wall-clock limit.
    #[must_use]
    pub const fn example_timeout(&self) -> Duration {
        Duration::from_secs(self.example_timeout_secs)
    }
}
