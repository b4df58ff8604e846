//! Scoped temporary files for a single example run.
//!
//! An [`ExecutionScope`] owns every file the runner creates for one example:
//! the rewritten execution target placed next to the entry point, and the
//! workspace descriptor placed in a private temporary directory outside the
//! checkout. Everything is removed when the scope is dropped, which happens
//! on success, on error and during unwinding alike.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::constants::{EXECUTION_TARGET_STEM, WORKSPACE_DESCRIPTOR_NAME};

/// Temporary files backing one example run.
///
/// # Examples
///
/// ```rust,no_run
/// use livedocs::examples::scope::ExecutionScope;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// {
///     let mut scope = ExecutionScope::new(Path::new("examples/basic"));
///     let target = scope.write_target(".go", "package main\n")?.to_path_buf();
///     assert!(target.exists());
/// } // target removed here
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExecutionScope {
    example_dir: PathBuf,
    target: Option<PathBuf>,
    scratch: Option<tempfile::TempDir>,
    workspace: Option<PathBuf>,
}

impl ExecutionScope {
    /// Opens a scope for an example directory. Nothing is created yet.
    pub fn new(example_dir: impl Into<PathBuf>) -> Self {
        Self {
            example_dir: example_dir.into(),
            target: None,
            scratch: None,
            workspace: None,
        }
    }

    /// Writes a rewritten execution target next to the entry point.
    ///
    /// The filename is unique per call (`livedocs_example_<uuid><ext>`), so two
    /// runs can never contend on the same path.
    pub fn write_target(&mut self, extension: &str, content: &str) -> Result<&Path> {
        let name = format!("{EXECUTION_TARGET_STEM}_{}{extension}", uuid::Uuid::new_v4().simple());
        let path = self.example_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write execution target: {}", path.display()))?;
        Ok(self.target.insert(path).as_path())
    }

    /// Writes a workspace descriptor into a private temporary directory.
    pub fn write_workspace(&mut self, content: &str) -> Result<&Path> {
        let scratch = tempfile::Builder::new()
            .prefix("livedocs-run-")
            .tempdir()
            .context("Failed to create scratch directory for workspace descriptor")?;
        let path = scratch.path().join(WORKSPACE_DESCRIPTOR_NAME);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write workspace descriptor: {}", path.display()))?;
        self.scratch = Some(scratch);
        Ok(self.workspace.insert(path).as_path())
    }

    /// Argument naming what to run: the rewritten target's filename, or `.`.
    #[must_use]
    pub fn target_arg(&self) -> String {
        self.target
            .as_ref()
            .and_then(|p| p.file_name())
            .map_or_else(|| ".".to_string(), |name| name.to_string_lossy().into_owned())
    }

    /// The workspace descriptor, if one was written.
    #[must_use]
    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }
}

impl Drop for ExecutionScope {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            match std::fs::remove_file(&target) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    target: "examples::runner",
                    "Failed to remove execution target {}: {}",
                    target.display(),
                    e
                ),
            }
        }
        // The scratch TempDir removes the descriptor when dropped.
        self.workspace = None;
        self.scratch = None;
    }
}
