use anyhow::{Context, Result};
use clap::Args;

use super::CliConfig;
use crate::manifest::ManifestStore;

/// Arguments of `livedocs show`.
#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Repository slug.
    pub repo: String,

    /// Example id.
    pub example: String,
}

impl ShowCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_docs_config(false).await?;
        let path = config.manifest_path();
        let store = tokio::task::spawn_blocking(move || ManifestStore::open(path))
            .await
            .context("Manifest read task panicked")??;

        let record = store.get(&self.repo, &self.example)?;
        let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
        println!("{json}");
        Ok(())
    }
}
