//! Command-line interface for livedocs.
//!
//! ```bash
//! livedocs generate                 # every configured repository
//! livedocs generate --repo str      # one repository
//! livedocs generate --fresh         # ignore cached results and checkouts
//! livedocs show str basic           # print a recorded run as JSON
//! ```
//!
//! Global flags control logging (`--verbose`, `--quiet`), the progress bar
//! (`--no-progress`) and the configuration file (`--config`, default
//! `livedocs.toml` in the working directory).

mod generate;
mod show;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::DocsConfig;
use crate::constants::{DEFAULT_CONFIG_FILE, MANIFEST_PATH_ENV};

pub use generate::GenerateCommand;
pub use show::ShowCommand;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Whether the progress bar is drawn.
    pub show_progress: bool,
    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Loads the configuration file.
    ///
    /// An explicit `--config` must exist. Without one, `livedocs.toml` is used
    /// when present; when `required` is false a missing default file yields
    /// the built-in defaults instead of an error.
    pub async fn load_docs_config(&self, required: bool) -> Result<DocsConfig> {
        if let Some(path) = &self.config_path {
            return DocsConfig::load(path).await;
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if required || tokio::fs::metadata(default_path).await.is_ok() {
            return DocsConfig::load(default_path).await;
        }
        let mut config = DocsConfig::default();
        config.resolve_paths(std::env::var_os(MANIFEST_PATH_ENV));
        Ok(config)
    }
}

/// Runs example programs and binds their output into documentation pages.
#[derive(Parser, Debug)]
#[command(name = "livedocs", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Do not draw the progress bar.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Path of the configuration file.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate documentation pages and the examples manifest.
    Generate(GenerateCommand),
    /// Print the recorded run of one example.
    Show(ShowCommand),
}

impl Cli {
    /// Initializes logging and runs the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(&config.log_level);
        self.execute_with_config(config).await
    }

    /// Derives [`CliConfig`] from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };
        CliConfig {
            log_level: log_level.to_string(),
            show_progress: !self.no_progress && !self.quiet,
            config_path: self.config.clone(),
        }
    }

    /// Runs the command with an already-built configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Generate(cmd) => cmd.execute(&config).await,
            Commands::Show(cmd) => cmd.execute(&config).await,
        }
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_level`. Calling it twice is harmless.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
