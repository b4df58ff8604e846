//! Description of the toolchain that runs example programs.
//!
//! Defaults describe the Go toolchain: `go run` in the example directory,
//! `go.mod` module roots, `go.work` workspaces selected through `GOWORK`.

use serde::{Deserialize, Serialize};

/// How example programs are discovered, invoked and isolated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    /// Executable invoked for every example.
    pub program: String,
    /// Arguments placed before the execution target.
    pub run_args: Vec<String>,
    /// Fenced-block info string of example code in documents.
    pub language: String,
    /// Filename marking a single example's entry point.
    pub entry_point: String,
    /// Examples directory, relative to the repository root.
    pub examples_dir: String,
    /// File marking a module root.
    pub module_marker: String,
    /// Dependency manifests in the repository root that feed the cache key, in order.
    pub dependency_manifests: Vec<String>,
    /// Variable that selects the workspace descriptor (`off` disables workspaces).
    pub workspace_env: String,
    /// Variables removed from the inherited environment of every run.
    pub cleared_env: Vec<String>,
    /// Output lines starting with one of these (after trimming) are toolchain noise.
    pub noise_prefixes: Vec<String>,
    /// Language version written into a synthesized workspace descriptor when no module declares one.
    pub default_go_version: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            run_args: vec!["run".to_string()],
            language: "go".to_string(),
            entry_point: "main.go".to_string(),
            examples_dir: "examples".to_string(),
            module_marker: "go.mod".to_string(),
            dependency_manifests: ["go.mod", "go.sum", "go.work", "go.work.sum"]
                .into_iter()
                .map(String::from)
                .collect(),
            workspace_env: "GOWORK".to_string(),
            cleared_env: vec!["GOWORK".to_string(), "GOFLAGS".to_string()],
            noise_prefixes: ["go: downloading ", "go: extracting ", "go: finding ", "go: found "]
                .into_iter()
                .map(String::from)
                .collect(),
            default_go_version: "1.21".to_string(),
        }
    }
}

impl Toolchain {
    /// Extension of the entry point, including the dot (`.go`).
    #[must_use]
    pub fn entry_extension(&self) -> String {
        std::path::Path::new(&self.entry_point)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }
}
