//! Error handling for livedocs
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`DocsError`]) for the failures callers need to
//!    tell apart: discovery, subprocess launch, configuration and sync errors.
//! 2. **User-friendly messages** ([`ErrorContext`]) with a suggestion and details
//!    when an error reaches the command line.
//!
//! Lower layers return `anyhow::Result` with context attached; the typed variants
//! are wrapped into that chain so [`user_friendly_error`] can downcast them back.
//!
//! # Error taxonomy
//!
//! - **Discovery**: [`DocsError::ExampleRead`] aborts the repository.
//! - **Execution start**: [`DocsError::ToolchainLaunch`] and
//!   [`DocsError::ExampleTimedOut`] abort the batch of the repository.
//! - **Execution outcome**: a non-zero exit is a recorded result, never an error.
//! - **Cache**: unreadable cache files are a miss and never reach this module.
//! - **Transform**: unmatched blocks degrade to plain blocks and never fail.
//!
//! # Examples
//!
//! ```rust,no_run
//! use livedocs::core::{DocsError, user_friendly_error};
//!
//! let err = anyhow::Error::from(DocsError::UnknownRepo {
//!     slug: "queue".to_string(),
//! });
//! let ctx = user_friendly_error(err);
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for livedocs operations.
///
/// Each variant carries enough context (repository slug, example id, path or
/// command) to locate the failure without re-running the pipeline.
#[derive(Error, Debug, Clone)]
pub enum DocsError {
    /// An entry point was found but could not be read.
    #[error("Failed to read example {path}: {reason}")]
    ExampleRead {
        /// Path of the entry point that failed to read
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// The toolchain process could not be started for an example.
    ///
    /// This is distinct from the example exiting non-zero, which is recorded
    /// as a normal result.
    #[error("Failed to launch '{program}' for example '{example}': {reason}")]
    ToolchainLaunch {
        /// Identifier of the example being run
        example: String,
        /// Toolchain program that failed to start
        program: String,
        /// Underlying spawn failure
        reason: String,
    },

    /// An example exceeded the configured wall-clock limit and was killed.
    #[error("Example '{example}' timed out after {seconds}s")]
    ExampleTimedOut {
        /// Identifier of the example being run
        example: String,
        /// Configured limit in seconds
        seconds: u64,
    },

    /// A batch of examples was aborted by its first failing job.
    #[error("Example batch for '{slug}' failed at example '{example}': {reason}")]
    BatchFailed {
        /// Repository slug of the batch
        slug: String,
        /// First example whose job failed
        example: String,
        /// Rendered cause of the failure
        reason: String,
    },

    /// The repository documentation file could not be read.
    #[error("Failed to read document {path}: {reason}")]
    DocumentRead {
        /// Path of the document
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// Configuration file could not be parsed.
    #[error("Invalid configuration in {file}")]
    ConfigParse {
        /// Path of the configuration file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A `--repo` filter named a repository that is not configured.
    #[error("Unknown repository '{slug}'")]
    UnknownRepo {
        /// The requested slug
        slug: String,
    },

    /// The configuration lists no repositories.
    #[error("No repositories configured")]
    NoRepositories,

    /// No recorded execution exists for the requested example.
    #[error("Example '{example}' not found for repository '{repo}'")]
    ExampleNotFound {
        /// Repository slug
        repo: String,
        /// Example identifier
        example: String,
    },

    /// A git command returned a non-zero exit status.
    #[error("Git operation failed: {operation}")]
    GitCommand {
        /// The git operation that failed (e.g. "clone", "fetch")
        operation: String,
        /// The error output from the git command
        stderr: String,
    },

    /// Git executable not found in PATH.
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// A configured local checkout does not exist.
    #[error("Local checkout for '{slug}' not found at {path}")]
    CheckoutMissing {
        /// Repository slug
        slug: String,
        /// Configured path
        path: String,
    },

    /// Any failure without a dedicated variant.
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },

    /// One or more repositories failed during a multi-repository run.
    #[error("{failed} of {total} repositories failed to generate")]
    GenerationIncomplete {
        /// Number of failed repositories
        failed: usize,
        /// Number of repositories attempted
        total: usize,
    },
}

/// Error wrapper that adds a suggestion and details for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DocsError,
    /// Optional suggestion on how to resolve the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Creates a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: DocsError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Adds a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Adds details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into an [`ErrorContext`] suitable for the command line.
///
/// Known [`DocsError`] variants anywhere in the chain get tailored suggestions.
/// Anything else is wrapped with its full cause chain as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let typed = error
        .downcast_ref::<DocsError>()
        .or_else(|| error.chain().find_map(|cause| cause.downcast_ref::<DocsError>()));
    if let Some(docs_error) = typed {
        let mut ctx = create_error_context(docs_error.clone());
        if ctx.details.is_none() {
            let chain = render_chain(&error);
            if !chain.is_empty() {
                ctx = ctx.with_details(chain);
            }
        }
        return ctx;
    }

    let ctx = ErrorContext::new(DocsError::Other {
        message: error.to_string(),
    });
    let chain = render_chain(&error);
    if chain.is_empty() { ctx } else { ctx.with_details(chain) }
}

fn render_chain(error: &anyhow::Error) -> String {
    error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>().join("\n  caused by: ")
}

fn create_error_context(error: DocsError) -> ErrorContext {
    match &error {
        DocsError::ToolchainLaunch {
            program,
            ..
        } => {
            let program = program.clone();
            ErrorContext::new(error)
                .with_suggestion(format!("Install '{program}' and make sure it is on PATH"))
        }
        DocsError::ExampleTimedOut {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Raise example_timeout_secs in the configuration or make the example terminate",
        ),
        DocsError::ConfigParse {
            reason,
            ..
        } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check the TOML syntax of the configuration file")
                .with_details(reason)
        }
        DocsError::UnknownRepo {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Use one of the slugs listed under [[repos]] in the configuration"),
        DocsError::NoRepositories => ErrorContext::new(error)
            .with_suggestion("Add at least one [[repos]] table to livedocs.toml"),
        DocsError::GitNotFound => ErrorContext::new(error)
            .with_suggestion("Install git from https://git-scm.com/ or set local_path for the repository"),
        DocsError::GitCommand {
            stderr,
            ..
        } => {
            let stderr = stderr.trim().to_string();
            ErrorContext::new(error)
                .with_suggestion("Check the source URL, branch and network access")
                .with_details(stderr)
        }
        DocsError::ExampleNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'livedocs generate' to record example output first"),
        _ => ErrorContext::new(error),
    }
}
