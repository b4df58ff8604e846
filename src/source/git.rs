//! Shallow clones managed with the system `git`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use super::{Checkout, RepoSync, SyncAction};
use crate::config::RepoConfig;
use crate::constants::{GIT_CLONE_TIMEOUT, GIT_FETCH_TIMEOUT};
use crate::core::DocsError;

/// Builder for one `git` invocation with captured output and a timeout.
///
/// ```rust,no_run
/// use livedocs::source::GitCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let head = GitCommand::new()
///     .args(["rev-parse", "HEAD"])
///     .current_dir("/tmp/livedocs/repos/str")
///     .with_context("str")
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout_duration: Duration,
    context: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            timeout_duration: GIT_FETCH_TIMEOUT,
            context: None,
        }
    }
}

impl GitCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the command with `-C dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub const fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Label prefixed to log lines, usually the repository slug.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    /// Executes the command and returns its stdout.
    ///
    /// # Errors
    ///
    /// [`DocsError::GitNotFound`] when git is not installed,
    /// [`DocsError::GitCommand`] on a non-zero exit or a timeout.
    pub async fn execute(self) -> Result<String> {
        let start = Instant::now();
        let ctx = self.context.clone().unwrap_or_else(|| "-".to_string());

        let mut full_args = Vec::new();
        if let Some(dir) = &self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());

        tracing::debug!(target: "source", "({}) Executing command: git {}", ctx, full_args.join(" "));

        let mut cmd = Command::new("git");
        cmd.args(&full_args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout_duration, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocsError::GitNotFound.into());
            }
            Ok(Err(e)) => {
                return Err(e).with_context(|| format!("Failed to execute git {}", full_args.join(" ")));
            }
            Err(_) => {
                tracing::warn!(
                    target: "source",
                    "({}) Command timed out after {} seconds: git {}",
                    ctx,
                    self.timeout_duration.as_secs(),
                    full_args.join(" ")
                );
                return Err(DocsError::GitCommand {
                    operation: self.operation(),
                    stderr: format!(
                        "Git command timed out after {} seconds. Check network access to the remote.",
                        self.timeout_duration.as_secs()
                    ),
                }
                .into());
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::debug!(
                target: "source",
                "({}) Command failed with exit code {:?}: {}",
                ctx,
                output.status.code(),
                stderr.trim()
            );
            return Err(DocsError::GitCommand {
                operation: self.operation(),
                stderr,
            }
            .into());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(
                target: "source::perf",
                "({}) Git {} took {:.2}s",
                ctx,
                self.operation(),
                elapsed.as_secs_f64()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Executes the command and returns trimmed stdout.
    pub async fn execute_stdout(self) -> Result<String> {
        Ok(self.execute().await?.trim().to_string())
    }

    /// Executes the command, discarding output.
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await.map(|_| ())
    }
}

/// Keeps one shallow clone per repository under a checkout root.
#[derive(Debug, Clone)]
pub struct GitSync {
    checkout_root: PathBuf,
    fresh: bool,
}

impl GitSync {
    pub fn new(checkout_root: impl Into<PathBuf>) -> Self {
        Self {
            checkout_root: checkout_root.into(),
            fresh: false,
        }
    }

    /// Deletes an existing clone and clones again.
    #[must_use]
    pub const fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Where the clone of `slug` lives.
    #[must_use]
    pub fn checkout_dir(&self, slug: &str) -> PathBuf {
        self.checkout_root.join(slug)
    }

    async fn clone_repo(&self, repo: &RepoConfig, dest: &Path) -> Result<()> {
        if tokio::fs::metadata(dest).await.is_ok() {
            tokio::fs::remove_dir_all(dest)
                .await
                .with_context(|| format!("Failed to clean checkout dir: {}", dest.display()))?;
        }
        tokio::fs::create_dir_all(&self.checkout_root)
            .await
            .with_context(|| format!("Failed to create {}", self.checkout_root.display()))?;

        let mut cmd = GitCommand::new().args(["clone", "--depth", "1"]);
        if !repo.branch.is_empty() {
            cmd = cmd.args(["--branch", repo.branch.as_str()]);
        }
        cmd.arg(repo.source_url.as_str())
            .arg(dest.display().to_string())
            .with_timeout(GIT_CLONE_TIMEOUT)
            .with_context(repo.slug.as_str())
            .execute_success()
            .await
    }

    async fn update_repo(&self, repo: &RepoConfig, dest: &Path) -> Result<()> {
        if repo.branch.is_empty() {
            return GitCommand::new()
                .args(["pull", "--ff-only"])
                .current_dir(dest)
                .with_context(repo.slug.as_str())
                .execute_success()
                .await;
        }

        GitCommand::new()
            .args(["fetch", "--prune", "--depth", "1", "origin", repo.branch.as_str()])
            .current_dir(dest)
            .with_context(repo.slug.as_str())
            .execute_success()
            .await?;
        GitCommand::new()
            .args(["checkout", "--force", "-B", repo.branch.as_str(), "FETCH_HEAD"])
            .current_dir(dest)
            .with_context(repo.slug.as_str())
            .execute_success()
            .await
    }
}

impl RepoSync for GitSync {
    async fn sync(&self, repo: &RepoConfig) -> Result<Checkout> {
        let dest = self.checkout_dir(&repo.slug);

        if self.fresh && tokio::fs::metadata(&dest).await.is_ok() {
            tracing::info!(
                target: "source",
                "Removing cached checkout of '{}' for a fresh run",
                repo.slug
            );
            tokio::fs::remove_dir_all(&dest)
                .await
                .with_context(|| format!("Failed to remove {}", dest.display()))?;
        }

        let is_git_repo = tokio::fs::metadata(dest.join(".git")).await.is_ok_and(|m| m.is_dir());
        let action = if is_git_repo {
            self.update_repo(repo, &dest)
                .await
                .with_context(|| format!("Failed to update checkout of '{}'", repo.slug))?;
            SyncAction::Updated
        } else {
            self.clone_repo(repo, &dest)
                .await
                .with_context(|| format!("Failed to clone '{}' from {}", repo.slug, repo.source_url))?;
            SyncAction::Cloned
        };

        tracing::info!(target: "source", "Repo '{}' {} at {}", repo.slug, action, dest.display());
        Ok(Checkout {
            path: dest,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use tempfile::tempdir;

    fn git(dir: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .args(["-c", "user.name=livedocs", "-c", "user.email=livedocs@example.com"])
            .args(args)
            .current_dir(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    /// A one-commit upstream repository on branch `main`.
    fn upstream(root: &Path) -> Option<PathBuf> {
        which::which("git").ok()?;
        let dir = root.join("upstream");
        std::fs::create_dir_all(&dir).unwrap();
        git(&dir, &["init", "-q", "-b", "main"]);
        std::fs::write(dir.join("README.md"), "# Upstream\n").unwrap();
        git(&dir, &["add", "."]);
        git(&dir, &["commit", "-q", "-m", "init"]);
        Some(dir)
    }

    fn repo_config(upstream: &Path) -> RepoConfig {
        RepoConfig::new("up", format!("file://{}", upstream.display()), "up.md")
    }

    #[tokio::test]
    async fn test_clone_then_update() {
        let temp = tempdir().unwrap();
        let Some(upstream) = upstream(temp.path()) else {
            return;
        };
        let sync = GitSync::new(temp.path().join("checkouts"));
        let repo = repo_config(&upstream);

        let first = sync.sync(&repo).await.unwrap();
        assert_eq!(first.action, SyncAction::Cloned);
        assert!(first.path.join("README.md").exists());

        std::fs::write(upstream.join("README.md"), "# Changed\n").unwrap();
        git(&upstream, &["commit", "-q", "-am", "change"]);

        let second = sync.sync(&repo).await.unwrap();
        assert_eq!(second.action, SyncAction::Updated);
        assert_eq!(std::fs::read_to_string(second.path.join("README.md")).unwrap(), "# Changed\n");

        let fresh = sync.clone().fresh(true).sync(&repo).await.unwrap();
        assert_eq!(fresh.action, SyncAction::Cloned);
    }

    #[tokio::test]
    async fn test_unknown_branch_is_git_error() {
        let temp = tempdir().unwrap();
        let Some(upstream) = upstream(temp.path()) else {
            return;
        };
        let mut repo = repo_config(&upstream);
        repo.branch = "does-not-exist".to_string();

        let err = GitSync::new(temp.path().join("checkouts")).sync(&repo).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocsError>(),
            Some(DocsError::GitCommand { operation, .. }) if operation == "clone"
        ));
    }
}
