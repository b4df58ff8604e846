//! Utilities shared by the pipeline.
//!
//! - [`fs`] - directory creation and atomic file writes used by every sink
//! - [`platform`] - host tool lookup
//! - [`progress`] - the repository progress bar

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, ensure_dir, ensure_parent_dir, normalize_path_for_storage};
pub use platform::command_exists;
pub use progress::repo_progress_bar;
