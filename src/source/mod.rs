//! Repository checkouts.
//!
//! The pipeline only needs a local directory holding the repository at the
//! desired branch. [`RepoSync`] is the seam that provides it:
//!
//! - [`GitSync`] keeps a shallow clone per repository under the checkout root
//!   and updates it in place on later runs
//! - [`LocalCheckout`] uses a configured directory as-is
//!
//! [`sync_for`] picks the right one for a [`RepoConfig`].

mod git;
mod local;

pub use git::{GitCommand, GitSync};
pub use local::LocalCheckout;

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::config::RepoConfig;

/// What a sync did to obtain the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// A new clone was created.
    Cloned,
    /// An existing clone was brought up to date.
    Updated,
    /// A local directory was used without touching it.
    Local,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cloned => "cloned",
            Self::Updated => "updated",
            Self::Local => "local",
        })
    }
}

/// A ready checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub path: PathBuf,
    pub action: SyncAction,
}

/// Produces a local checkout of a repository.
pub trait RepoSync: Send + Sync {
    fn sync(&self, repo: &RepoConfig) -> impl Future<Output = Result<Checkout>> + Send;
}

/// Either sync strategy, chosen per repository.
#[derive(Debug, Clone)]
pub enum AnySync {
    Git(GitSync),
    Local(LocalCheckout),
}

impl RepoSync for AnySync {
    async fn sync(&self, repo: &RepoConfig) -> Result<Checkout> {
        match self {
            Self::Git(git) => git.sync(repo).await,
            Self::Local(local) => local.sync(repo).await,
        }
    }
}

/// [`LocalCheckout`] when the repository has a `local_path`, otherwise a
/// [`GitSync`] under `checkout_root`.
#[must_use]
pub fn sync_for(repo: &RepoConfig, checkout_root: &Path, fresh: bool) -> AnySync {
    match &repo.local_path {
        Some(_) => AnySync::Local(LocalCheckout),
        None => AnySync::Git(GitSync::new(checkout_root).fresh(fresh)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_for_prefers_local_path() {
        let mut repo = RepoConfig::new("str", "https://github.com/goforj/str.git", "str.md");
        assert!(matches!(sync_for(&repo, Path::new("/tmp/x"), false), AnySync::Git(_)));

        repo.local_path = Some(PathBuf::from("/src/str"));
        assert!(matches!(sync_for(&repo, Path::new("/tmp/x"), true), AnySync::Local(_)));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(SyncAction::Cloned.to_string(), "cloned");
        assert_eq!(SyncAction::Local.to_string(), "local");
    }
}
