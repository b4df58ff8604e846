//! README to documentation page transformation.
//!
//! [`transform_document`] runs a fixed sequence of line-oriented passes over a
//! repository README:
//!
//! 1. [`links::rewrite_images`] makes relative image references absolute
//!    against the raw-content base
//! 2. [`links::rewrite_links`] makes relative link targets absolute against
//!    the web base, picking `blob` or `tree` URLs
//! 3. [`embed::bind_examples`] wraps code blocks that correspond to a recorded
//!    example run and collects the consumed runs as manifest records
//! 4. [`anchors::rewrite_heading_anchors`] gives every heading a unique
//!    explicit anchor
//! 5. a front matter header with the page title and repository is prepended
//!
//! None of the passes can fail: anything they do not understand is copied
//! through unchanged.

pub mod anchors;
pub mod embed;
pub mod links;

pub use anchors::{AnchorRegistry, rewrite_heading_anchors, slugify};
pub use embed::{BoundDocument, bind_examples, executable_body};
pub use links::{rewrite_images, rewrite_links};

use std::collections::BTreeMap;

use crate::config::RepoConfig;
use crate::examples::ExecutionResult;
use crate::manifest::ManifestRecord;

/// A rendered page plus the manifest records of the examples it embeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedDocument {
    /// The final page, front matter included.
    pub content: String,
    /// One record per embedded example, keyed by example id.
    pub records: BTreeMap<String, ManifestRecord>,
}

/// Transforms `readme` into the documentation page for `repo`.
///
/// `results` must be sorted by id; content matching prefers earlier results.
#[must_use]
pub fn transform_document(
    readme: &str,
    repo: &RepoConfig,
    language: &str,
    results: &[ExecutionResult],
) -> TransformedDocument {
    let content = rewrite_images(readme, &repo.raw_base());
    let content = rewrite_links(&content, &repo.web_base(), &repo.branch);

    let bound = bind_examples(&content, &repo.slug, language, results);
    tracing::debug!(
        target: "markdown",
        "Bound {} of {} examples into '{}'",
        bound.records.len(),
        results.len(),
        repo.slug
    );

    let content = rewrite_heading_anchors(&bound.content, repo.display_title());

    TransformedDocument {
        content: with_front_matter(repo, &content),
        records: bound.records,
    }
}

/// Prepends the page header.
#[must_use]
pub fn with_front_matter(repo: &RepoConfig, content: &str) -> String {
    format!(
        "---\ntitle: {}\nrepoSlug: {}\nrepoUrl: {}\n---\n\n{}",
        repo.display_title(),
        repo.slug,
        repo.repo_url(),
        content
    )
}

/// An opening code fence: the fence run (e.g. "```") and its info string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fence {
    pub marker: String,
    pub info: String,
}

impl Fence {
    /// Parses an opening fence line.
    pub(crate) fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let ch = trimmed.chars().next()?;
        if ch != '`' && ch != '~' {
            return None;
        }
        let run = trimmed.chars().take_while(|&c| c == ch).count();
        if run < 3 {
            return None;
        }
        let info = trimmed[run..].trim();
        if ch == '`' && info.contains('`') {
            return None;
        }
        Some(Self {
            marker: trimmed[..run].to_string(),
            info: info.to_string(),
        })
    }

    /// Whether `line` closes this fence.
    pub(crate) fn closes(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let ch = self.marker.chars().next().unwrap_or('`');
        trimmed.len() >= self.marker.len() && trimmed.chars().all(|c| c == ch)
    }

    /// Language tag: the first word of the info string, lowercased.
    pub(crate) fn language(&self) -> String {
        self.info.split_whitespace().next().unwrap_or("").to_ascii_lowercase()
    }
}

/// Applies `rewrite` to every line outside fenced code blocks.
pub(crate) fn map_prose_lines(content: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut fence: Option<Fence> = None;
    let mut out = Vec::new();
    for line in content.split('\n') {
        match &fence {
            Some(open) => {
                if open.closes(line) {
                    fence = None;
                }
                out.push(line.to_string());
            }
            None => {
                if let Some(open) = Fence::open(line) {
                    fence = Some(open);
                    out.push(line.to_string());
                } else {
                    out.push(rewrite(line));
                }
            }
        }
    }
    out.join("\n")
}
