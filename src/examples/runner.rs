//! Isolated execution of a single example program.
//!
//! [`ToolchainRunner`] runs one [`ExampleUnit`] as a fresh toolchain
//! subprocess in the example's own directory and records what it printed.
//!
//! # Isolation and resolution
//!
//! Two independent mechanisms are applied to every run, in this order:
//!
//! 1. **Isolation**: every variable in [`Toolchain::cleared_env`] is removed from
//!    the inherited environment, so settings of an enclosing checkout cannot
//!    leak into the run.
//! 2. **Resolution**: the workspace variable is then set explicitly. When the
//!    example sits inside two or more module roots (below the repository
//!    root), a workspace descriptor listing all of them, innermost first, is
//!    synthesized and selected; otherwise workspaces are turned `off`.
//!
//! # Output
//!
//! Standard error is appended to standard output so the recorded output reads
//! like one console transcript, and toolchain progress lines (module
//! downloads and the like) are dropped.

use anyhow::Result;
use regex::Regex;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tokio::process::Command;

use super::scope::ExecutionScope;
use super::{ExampleUnit, ExecutionResult};
use crate::config::Toolchain;
use crate::constants::SLOW_EXAMPLE_THRESHOLD;
use crate::core::DocsError;

static GO_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*go\s+([0-9][0-9A-Za-z.\-]*)\s*$").expect("valid regex"));

/// Executes one example and records its behavior.
///
/// Implementations must return `Err` only when the example could not be run
/// at all; a program that runs and fails is an `Ok` result with a non-zero
/// exit code.
pub trait ExampleRunner: Send + Sync {
    /// Runs `unit` and returns its recorded result.
    fn run(&self, unit: &ExampleUnit) -> impl Future<Output = Result<ExecutionResult>> + Send;
}

/// Runs examples with the configured toolchain.
#[derive(Debug, Clone)]
pub struct ToolchainRunner {
    toolchain: Arc<Toolchain>,
    repo_root: PathBuf,
    timeout: Duration,
}

impl ToolchainRunner {
    /// Creates a runner for examples of the repository checked out at `repo_root`.
    pub fn new(toolchain: Arc<Toolchain>, repo_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            toolchain,
            repo_root: repo_root.into(),
            timeout,
        }
    }

    fn prepare_scope(&self, unit: &ExampleUnit, example_dir: &Path) -> Result<ExecutionScope> {
        let mut scope = ExecutionScope::new(example_dir);

        if has_isolation_marker(&unit.source) {
            let stripped = strip_build_directives(&unit.source);
            let target = scope.write_target(&self.toolchain.entry_extension(), &stripped)?;
            tracing::debug!(
                target: "examples::runner",
                "({}) Isolation marker found, running rewritten target {}",
                unit.id,
                target.display()
            );
        }

        let roots = find_module_roots(example_dir, &self.repo_root, &self.toolchain.module_marker);
        if roots.len() >= 2 {
            let descriptor = workspace_descriptor(&roots, &self.toolchain);
            let path = scope.write_workspace(&descriptor)?;
            tracing::debug!(
                target: "examples::runner",
                "({}) Using workspace of {} modules at {}",
                unit.id,
                roots.len(),
                path.display()
            );
        }

        Ok(scope)
    }

    fn build_command(&self, example_dir: &Path, scope: &ExecutionScope) -> Command {
        let mut cmd = Command::new(&self.toolchain.program);
        cmd.args(&self.toolchain.run_args)
            .arg(scope.target_arg())
            .current_dir(example_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for name in &self.toolchain.cleared_env {
            cmd.env_remove(name);
        }
        if !self.toolchain.workspace_env.is_empty() {
            match scope.workspace() {
                Some(descriptor) => cmd.env(&self.toolchain.workspace_env, descriptor),
                None => cmd.env(&self.toolchain.workspace_env, "off"),
            };
        }
        cmd
    }
}

impl ExampleRunner for ToolchainRunner {
    async fn run(&self, unit: &ExampleUnit) -> Result<ExecutionResult> {
        let example_dir = unit
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        // Dropping the scope removes every temporary file, on every exit path.
        let scope = self.prepare_scope(unit, &example_dir)?;
        let mut cmd = self.build_command(&example_dir, &scope);

        tracing::debug!(
            target: "examples::runner",
            "({}) Executing: {} {} {}",
            unit.id,
            self.toolchain.program,
            self.toolchain.run_args.join(" "),
            scope.target_arg()
        );

        let start = Instant::now();
        let child = cmd.spawn().map_err(|e| DocsError::ToolchainLaunch {
            example: unit.id.clone(),
            program: self.toolchain.program.clone(),
            reason: e.to_string(),
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| DocsError::ToolchainLaunch {
                example: unit.id.clone(),
                program: self.toolchain.program.clone(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                tracing::warn!(
                    target: "examples::runner",
                    "({}) Killed after {}s",
                    unit.id,
                    self.timeout.as_secs()
                );
                return Err(DocsError::ExampleTimedOut {
                    example: unit.id.clone(),
                    seconds: self.timeout.as_secs(),
                }
                .into());
            }
        };
        let elapsed = start.elapsed();
        drop(scope);

        let exit_code = if output.status.success() { 0 } else { output.status.code().unwrap_or(1) };
        let (stdout, stderr) = merge_output(
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        );
        let stdout = filter_toolchain_noise(&stdout, &self.toolchain.noise_prefixes);

        if elapsed > SLOW_EXAMPLE_THRESHOLD {
            tracing::info!(
                target: "examples::perf",
                "({}) Example took {:.2}s",
                unit.id,
                elapsed.as_secs_f64()
            );
        } else {
            tracing::debug!(
                target: "examples::perf",
                "({}) Example took {}ms",
                unit.id,
                elapsed.as_millis()
            );
        }
        if exit_code != 0 {
            tracing::debug!(target: "examples::runner", "({}) Exited with code {}", unit.id, exit_code);
        }

        Ok(ExecutionResult {
            id: unit.id.clone(),
            source: unit.source.clone(),
            normalized: unit.normalized.clone(),
            stdout,
            stderr,
            exit_code,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

fn is_build_directive(trimmed: &str) -> bool {
    trimmed.starts_with("//go:build") || trimmed.starts_with("// +build")
}

/// Whether the leading build directives exclude the file from normal builds.
///
/// Only the directive lines before the first other non-blank line count.
#[must_use]
pub fn has_isolation_marker(source: &str) -> bool {
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !is_build_directive(trimmed) {
            break;
        }
        if trimmed.split_whitespace().any(|word| word.trim_matches(|c| c == '!' || c == '(' || c == ')') == "ignore") {
            return true;
        }
    }
    false
}

/// Removes every build directive line, keeping all other lines verbatim.
#[must_use]
pub fn strip_build_directives(source: &str) -> String {
    source
        .split_inclusive('\n')
        .filter(|line| !is_build_directive(line.trim()))
        .collect()
}

/// Directories from `example_dir` up to `repo_root` that contain `marker`,
/// innermost first.
///
/// The walk never leaves the repository: when `example_dir` is outside
/// `repo_root`, only `example_dir` itself is inspected.
#[must_use]
pub fn find_module_roots(example_dir: &Path, repo_root: &Path, marker: &str) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let mut current = Some(example_dir);
    while let Some(dir) = current {
        if dir.join(marker).is_file() {
            roots.push(dir.to_path_buf());
        }
        if dir == repo_root || !dir.starts_with(repo_root) {
            break;
        }
        current = dir.parent();
    }
    roots
}

/// Renders a workspace descriptor over `roots` with absolute `use` paths.
///
/// The language version comes from the innermost module that declares one.
#[must_use]
pub fn workspace_descriptor(roots: &[PathBuf], toolchain: &Toolchain) -> String {
    let version = roots
        .iter()
        .find_map(|root| {
            let manifest = std::fs::read_to_string(root.join(&toolchain.module_marker)).ok()?;
            GO_DIRECTIVE.captures(&manifest).map(|c| c[1].to_string())
        })
        .unwrap_or_else(|| toolchain.default_go_version.clone());

    let mut out = format!("go {version}\n\nuse (\n");
    for root in roots {
        let absolute = std::path::absolute(root).unwrap_or_else(|_| root.clone());
        out.push('\t');
        out.push_str(&quote_use_path(&absolute.to_string_lossy()));
        out.push('\n');
    }
    out.push_str(")\n");
    out
}

fn quote_use_path(path: &str) -> String {
    if path.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("{path:?}")
    } else {
        path.to_string()
    }
}

/// Folds non-blank stderr into stdout, on its own line.
///
/// Returns the merged stdout and whatever remains of stderr (empty when it
/// was merged).
#[must_use]
pub fn merge_output(stdout: String, stderr: String) -> (String, String) {
    if stderr.trim().is_empty() {
        return (stdout, stderr);
    }
    let mut out = stdout;
    if !out.trim().is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&stderr);
    (out, String::new())
}

/// Drops toolchain progress lines, keeping program output byte-for-byte.
#[must_use]
pub fn filter_toolchain_noise(output: &str, prefixes: &[String]) -> String {
    if output.is_empty() || prefixes.is_empty() {
        return output.to_string();
    }
    output
        .split_inclusive('\n')
        .filter(|line| {
            let trimmed = line.trim_start();
            !prefixes.iter().any(|prefix| trimmed.starts_with(prefix.as_str()))
        })
        .collect()
}
