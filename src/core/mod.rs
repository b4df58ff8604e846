//! Core types shared by every livedocs module.
//!
//! - [`DocsError`] - typed failures of the pipeline
//! - [`ErrorContext`] / [`user_friendly_error`] - terminal-friendly error rendering

pub mod error;

pub use error::{DocsError, ErrorContext, user_friendly_error};
