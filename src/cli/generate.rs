use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use crate::config::DocsConfig;
use crate::pipeline::{GenerateOptions, GenerationReport, Pipeline};
use crate::utils::{command_exists, repo_progress_bar};

/// Arguments of `livedocs generate`.
#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// Only generate the repository with this slug.
    #[arg(long, value_name = "SLUG")]
    pub repo: Option<String>,

    /// Re-run every example and re-clone checkouts, ignoring caches.
    #[arg(long)]
    pub fresh: bool,
}

impl GenerateCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_docs_config(true).await?;
        warn_missing_tools(&config);
        let options = GenerateOptions {
            repo: self.repo,
            fresh: self.fresh,
        };

        let progress = repo_progress_bar(config.repos.len() as u64, cli.show_progress);
        let pipeline = Pipeline::new(config).with_progress(progress.clone());
        let report = pipeline.generate(&options).await;
        progress.finish_and_clear();

        let report = report?;
        if cli.log_level != "warn" {
            print_summary(&report);
        }
        report.into_result().map(|_| ())
    }
}

fn warn_missing_tools(config: &DocsConfig) {
    if !command_exists(&config.toolchain.program) {
        tracing::warn!(
            "'{}' was not found on PATH; every example run will fail",
            config.toolchain.program
        );
    }
    if config.repos.iter().any(|r| r.local_path.is_none()) && !command_exists("git") {
        tracing::warn!("git was not found on PATH; remote repositories cannot be synchronized");
    }
}

fn print_summary(report: &GenerationReport) {
    for outcome in &report.succeeded {
        println!(
            "{} {} -> {} ({} of {} examples embedded)",
            "✓".green(),
            outcome.slug.bold(),
            outcome.output_path.display(),
            outcome.records.len(),
            outcome.examples
        );
    }
    for (slug, err) in &report.failed {
        println!("{} {}: {:#}", "✗".red(), slug.bold(), err);
    }
    if let Some(path) = &report.manifest_path {
        println!("Manifest: {}", path.display());
    }
}
