//! Fixtures for repository checkouts.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::RepoConfig;

/// Writes `<repo>/examples/<id>/main.go` with `source` and returns its path.
///
/// Panics on I/O errors; intended for unit tests.
pub fn write_example(repo: &Path, id: &str, source: &str) -> PathBuf {
    let dir = repo.join("examples").join(id);
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create {}: {e}", dir.display()));
    let path = dir.join("main.go");
    fs::write(&path, source).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
    path
}

/// A throwaway repository checkout plus an output docs directory.
///
/// Everything lives in one temp dir that is removed on drop.
#[derive(Debug)]
pub struct RepoFixture {
    temp: TempDir,
}

impl RepoFixture {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("Failed to create fixture dir")?;
        fs::create_dir_all(temp.path().join("repo"))?;
        Ok(Self {
            temp,
        })
    }

    /// Root of the fixture temp dir.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// The checkout directory.
    pub fn repo_dir(&self) -> PathBuf {
        self.temp.path().join("repo")
    }

    /// Where generated documents are written.
    pub fn docs_dir(&self) -> PathBuf {
        self.temp.path().join("docs")
    }

    /// Where cache files and the manifest go.
    pub fn state_dir(&self) -> PathBuf {
        self.temp.path().join("state")
    }

    /// Adds an example program.
    pub fn example(&self, id: &str, source: &str) -> Result<PathBuf> {
        let dir = self.repo_dir().join("examples").join(id);
        fs::create_dir_all(&dir)?;
        let path = dir.join("main.go");
        fs::write(&path, source).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Writes any file relative to the checkout.
    pub fn file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.repo_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Writes the README.
    pub fn readme(&self, content: &str) -> Result<PathBuf> {
        self.file("README.md", content)
    }

    /// A repo config pointing at this checkout.
    pub fn repo_config(&self, slug: &str) -> RepoConfig {
        let mut repo = RepoConfig::new(
            slug,
            format!("https://github.com/goforj/{slug}.git"),
            format!("libraries/{slug}.md"),
        );
        repo.local_path = Some(self.repo_dir());
        repo
    }
}
