//! Test utilities for livedocs
//!
//! Helpers shared by the unit tests and the integration suite:
//! - [`init_test_logging`] wires `tracing` into the test harness output
//! - [`ScriptedRunner`] is an [`ExampleRunner`](crate::examples::ExampleRunner)
//!   with canned output, per-example delays and forced failures
//! - [`RepoFixture`] lays out a checkout with examples and a README
//!
//! # Example
//!
//! ```rust,no_run
//! use livedocs::test_utils::{RepoFixture, init_test_logging};
//!
//! init_test_logging(None);
//! let repo = RepoFixture::new().unwrap();
//! repo.example("basic", "package main\n\nfunc main() {}\n").unwrap();
//! ```

pub mod fixtures;
pub mod runner;

pub use fixtures::{RepoFixture, write_example};
pub use runner::ScriptedRunner;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with
/// neither set, tests run silently.
///
/// ```bash
/// RUST_LOG=examples::runner=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
