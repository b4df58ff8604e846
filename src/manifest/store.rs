//! Read-only access to the manifest for the serving side.

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{ExampleManifest, ManifestRecord};
use crate::core::DocsError;

/// A manifest loaded once and held for the lifetime of its owner.
///
/// Construct it with [`ManifestStore::open`] and pass it to whatever answers
/// lookups; it never re-reads the file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    manifest: ExampleManifest,
}

impl ManifestStore {
    /// Loads the manifest at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let manifest = ExampleManifest::load(&path)?;
        tracing::debug!(
            target: "manifest",
            "Loaded {} example records from {}",
            manifest.len(),
            path.display()
        );
        Ok(Self {
            path,
            manifest,
        })
    }

    /// File the store was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded manifest.
    #[must_use]
    pub const fn manifest(&self) -> &ExampleManifest {
        &self.manifest
    }

    /// Looks up one example.
    pub fn get(&self, repo: &str, example: &str) -> Result<&ManifestRecord, DocsError> {
        self.manifest.get(repo, example).ok_or_else(|| DocsError::ExampleNotFound {
            repo: repo.to_string(),
            example: example.to_string(),
        })
    }
}
