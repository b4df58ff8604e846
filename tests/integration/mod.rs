//! Integration test suite for livedocs
//!
//! End-to-end tests that drive the library pipeline and the `livedocs`
//! binary against throwaway checkouts.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: library-level generation with a scripted runner
//! - **cli**: the `livedocs` binary with a shell toolchain
//! - **go_toolchain**: real `go run` executions, skipped when Go is missing

mod cli;
mod go_toolchain;
mod pipeline;
