//! livedocs - runs the example programs of source repositories and binds
//! their recorded output into documentation pages.
//!
//! # Architecture Overview
//!
//! Every configured repository goes through the same pipeline:
//! - its checkout is synchronized (shallow git clone/update, or a local path)
//! - every `examples/<id>/main.go` program is run in isolation, with results
//!   cached under a content hash of the repository
//! - the README is rewritten for the documentation site: links and images
//!   point at the hosted repository, heading anchors are unique, and code
//!   blocks that match an example are wrapped in an embed component
//! - the recorded runs are merged into one JSON manifest the site reads
//!
//! # Core Modules
//!
//! - [`config`] - `livedocs.toml` parsing, repository list and toolchain profile
//! - [`core`] - error types and user-facing error rendering
//! - [`source`] - repository checkouts (git and local)
//! - [`examples`] - discovery, execution, caching and batch coordination
//! - [`markdown`] - README rewriting and example binding
//! - [`manifest`] - the examples manifest and its query interface
//! - [`pipeline`] - per-repository orchestration
//! - [`cli`] - the `livedocs` command line
//! - [`utils`] - file system and progress helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use livedocs::config::DocsConfig;
//! use livedocs::pipeline::{GenerateOptions, Pipeline};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = DocsConfig::load(Path::new("livedocs.toml")).await?;
//! let report = Pipeline::new(config).generate(&GenerateOptions::default()).await?;
//! println!("{} of {} repositories generated", report.succeeded.len(), report.total());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod examples;
pub mod manifest;
pub mod markdown;
pub mod pipeline;
pub mod source;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
