//! Example discovery, execution and caching.
//!
//! The flow for one repository is:
//!
//! 1. [`discovery`] walks the examples directory and yields [`ExampleUnit`]s
//! 2. [`cache_key`] hashes every input that can change their output
//! 3. [`cache_store`] returns the recorded [`ExecutionResult`]s on a hit
//! 4. on a miss, [`coordinator`] runs the units through a [`runner`], a bounded
//!    number at a time, sorts the results by id and persists them
//!
//! [`ExampleBatch`] ties these steps together.

pub mod cache_key;
pub mod cache_store;
pub mod coordinator;
pub mod discovery;
pub mod normalize;
pub mod runner;
pub mod scope;

pub use cache_key::{CacheKey, compute_cache_key};
pub use cache_store::ExecutionCacheStore;
pub use coordinator::{ExampleBatch, ExecutionCoordinator};
pub use discovery::discover_examples;
pub use normalize::normalize_code;
pub use runner::{ExampleRunner, ToolchainRunner};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One discovered runnable example program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleUnit {
    /// Name of the directory holding the entry point.
    pub id: String,
    /// Path of the entry point file.
    pub path: PathBuf,
    /// Source text as read from disk.
    pub source: String,
    /// Source after [`normalize_code`].
    pub normalized: String,
}

impl ExampleUnit {
    /// Builds a unit, normalizing its source.
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        let source = source.into();
        let normalized = normalize_code(&source);
        Self {
            id: id.into(),
            path: path.into(),
            source,
            normalized,
        }
    }
}

/// Recorded outcome of running one example.
///
/// Persisted verbatim in the execution cache. `stderr` is normally empty
/// because the runner folds it into `stdout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub id: String,
    pub source: String,
    pub normalized: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

