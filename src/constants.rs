//! Global constants used throughout the livedocs codebase.
//!
//! Cache markers, well-known filenames, concurrency bounds and timeouts live
//! here so that every module agrees on them.

use std::time::Duration;

/// Marker fed into every cache key before any content.
///
/// Bump the suffix whenever the runner changes how output is captured or
/// filtered, so results recorded by an older pipeline are never reused.
pub const PIPELINE_VERSION_MARKER: &str = "livedocs-examples-cache:content-hash:v1\n";

/// Prefix of every file the runner may write inside a checkout.
///
/// The cache key builder skips files carrying this prefix in case a previous
/// run was interrupted before its cleanup ran.
pub const TRANSIENT_FILE_PREFIX: &str = "livedocs_";

/// Stem of the rewritten execution target written next to an entry point.
pub const EXECUTION_TARGET_STEM: &str = "livedocs_example";

/// Filename of the synthesized multi-module workspace descriptor.
pub const WORKSPACE_DESCRIPTOR_NAME: &str = "livedocs.work";

/// Name of the directory, below the cache root, holding cached result sets.
pub const EXAMPLES_CACHE_DIR: &str = "examples-cache";

/// Name of the application directory created under the system temp dir.
pub const APP_TEMP_DIR: &str = "livedocs";

/// Environment variable that overrides the manifest location.
pub const MANIFEST_PATH_ENV: &str = "LIVEDOCS_EXAMPLES_MANIFEST";

/// Default configuration filename looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "livedocs.toml";

/// Default bound on concurrently running example subprocesses per repository.
pub const DEFAULT_EXAMPLE_CONCURRENCY: usize = 10;

/// Default bound on repositories generated at the same time.
pub const DEFAULT_REPO_CONCURRENCY: usize = 4;

/// Default wall-clock limit for a single example run (5 minutes).
pub const DEFAULT_EXAMPLE_TIMEOUT_SECS: u64 = 300;

/// Runs slower than this are reported at `info` level.
pub const SLOW_EXAMPLE_THRESHOLD: Duration = Duration::from_secs(1);

/// Timeout for Git clone operations (120 seconds).
pub const GIT_CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for Git fetch, checkout and reset operations (60 seconds).
pub const GIT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Tag of the component that binds a code block to a recorded run.
pub const EMBED_COMPONENT: &str = "LiveExample";
