//! The examples manifest: recorded runs keyed by repository and example id.
//!
//! The manifest is the hand-off point to the serving layer, which reads it to
//! answer "what did this example print" without running anything.
//!
//! ```json
//! {
//!   "str": {
//!     "basic": {
//!       "title": "basic",
//!       "language": "go",
//!       "source": "package main\n...",
//!       "stdout": "hello\n",
//!       "stderr": "",
//!       "exitCode": 0,
//!       "durationMs": 412
//!     }
//!   }
//! }
//! ```
//!
//! Writers go through [`ExampleManifest::merge_into`], which replaces the
//! records of the regenerated repositories and keeps everything else.
//! Readers use [`ManifestStore`].

mod store;

pub use store::ManifestStore;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::examples::ExecutionResult;
use crate::utils::atomic_write;

/// One recorded example run as published to the serving layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    pub title: String,
    pub language: String,
    /// Full program source. Older manifests call this field `code`.
    #[serde(alias = "code")]
    pub source: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl ManifestRecord {
    /// Builds the record for a consumed result.
    #[must_use]
    pub fn from_result(result: &ExecutionResult, language: &str) -> Self {
        Self {
            title: result.id.clone(),
            language: language.to_string(),
            source: result.source.clone(),
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
            exit_code: result.exit_code,
            duration_ms: result.duration_ms,
        }
    }
}

/// Records of one repository, keyed by example id.
pub type RepoRecords = BTreeMap<String, ManifestRecord>;

/// The whole manifest. Keys are sorted so the file is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExampleManifest {
    repos: BTreeMap<String, RepoRecords>,
}

impl ExampleManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a manifest file.
    ///
    /// A missing file is an empty manifest. An unparsable file is logged and
    /// also treated as empty, since every record in it can be regenerated.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read manifest: {}", path.display()));
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                tracing::warn!(
                    target: "manifest",
                    "Discarding unreadable manifest {}: {}",
                    path.display(),
                    e
                );
                Ok(Self::new())
            }
        }
    }

    /// Writes the manifest atomically as pretty JSON, creating parent dirs.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut payload =
            serde_json::to_vec_pretty(self).context("Failed to serialize examples manifest")?;
        payload.push(b'\n');
        atomic_write(path, &payload)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))
    }

    /// Replaces every record of `slug`.
    pub fn replace_repo(&mut self, slug: &str, records: RepoRecords) {
        self.repos.insert(slug.to_string(), records);
    }

    /// Records of one repository.
    #[must_use]
    pub fn repo(&self, slug: &str) -> Option<&RepoRecords> {
        self.repos.get(slug)
    }

    /// One record.
    #[must_use]
    pub fn get(&self, slug: &str, example: &str) -> Option<&ManifestRecord> {
        self.repos.get(slug)?.get(example)
    }

    /// Repository slugs present in the manifest.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.repos.keys().map(String::as_str)
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repos.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads the file at `path`, replaces the repositories in `updates` and
    /// writes it back.
    pub fn merge_into(path: &Path, updates: BTreeMap<String, RepoRecords>) -> Result<Self> {
        let mut manifest = Self::load(path)?;
        let repos = updates.len();
        for (slug, records) in updates {
            manifest.replace_repo(&slug, records);
        }
        manifest.save(path)?;
        tracing::info!(
            target: "manifest",
            "Updated {} repositories in {} ({} records total)",
            repos,
            path.display(),
            manifest.len()
        );
        Ok(manifest)
    }
}
