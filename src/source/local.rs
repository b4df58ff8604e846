use anyhow::Result;

use super::{Checkout, RepoSync, SyncAction};
use crate::config::RepoConfig;
use crate::core::DocsError;

/// Uses `local_path` of the repository without syncing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCheckout;

impl RepoSync for LocalCheckout {
    async fn sync(&self, repo: &RepoConfig) -> Result<Checkout> {
        let missing = || DocsError::CheckoutMissing {
            slug: repo.slug.clone(),
            path: repo
                .local_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
        };

        let Some(path) = repo.local_path.clone() else {
            return Err(missing().into());
        };
        if !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(missing().into());
        }

        tracing::debug!(target: "source", "Using local checkout {} for '{}'", path.display(), repo.slug);
        Ok(Checkout {
            path,
            action: SyncAction::Local,
        })
    }
}
