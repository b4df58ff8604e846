//! Unique heading anchors.
//!
//! Every heading gets an explicit `{#anchor}` suffix. Anchors already present,
//! written either as `{#id}` or as a leading `<a id="id"></a>`, are kept;
//! everything else is slugified from the heading text. Collisions get `-2`,
//! `-3`, ... in document order.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::map_prose_lines;

static HEADING_WITH_HTML_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(#{2,6}) <a (?:id|name)="([^"]+)"></a>\s*(.+)$"#).expect("valid regex")
});

static HEADING_WITH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s+\{#([^}]+)\}\s*$").expect("valid regex"));

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*$").expect("valid regex"));

const STRIPPED_CHARS: &[char] = &[
    '·', '—', '–', '`', '\'', '"', '(', ')', '[', ']', '{', '}', '!', '?', ',', '.', ':', ';',
    '/', '\\', '<', '>', '&', '*', '+', '=', '|', '~', '^', '$', '@', '%',
];

/// A parsed ATX heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Number of `#` characters.
    pub level: usize,
    /// Heading text without markers or anchors.
    pub title: String,
    /// Anchor written by the author, if any.
    pub explicit_anchor: Option<String>,
}

impl Heading {
    /// Parses `line` as a heading.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        if let Some(caps) = HEADING_WITH_HTML_ANCHOR.captures(line) {
            return Some(Self {
                level: caps[1].len(),
                title: caps[3].trim().to_string(),
                explicit_anchor: Some(caps[2].to_string()),
            });
        }
        if let Some(caps) = HEADING_WITH_ID.captures(line) {
            return Some(Self {
                level: caps[1].len(),
                title: caps[2].trim().to_string(),
                explicit_anchor: Some(caps[3].to_string()),
            });
        }
        HEADING.captures(line).map(|caps| Self {
            level: caps[1].len(),
            title: caps[2].trim().to_string(),
            explicit_anchor: None,
        })
    }

    /// The explicit anchor, or the slug of the title.
    #[must_use]
    pub fn anchor(&self) -> String {
        self.explicit_anchor.clone().unwrap_or_else(|| slugify(&self.title))
    }
}

/// Derives an anchor from heading text.
///
/// Lowercases, drops a fixed set of punctuation, turns whitespace into `-`
/// and collapses repeated hyphens.
#[must_use]
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if STRIPPED_CHARS.contains(&ch) {
            continue;
        }
        if ch == ' ' || ch == '\t' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
            continue;
        }
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }
    slug.trim_matches('-').to_string()
}

/// Anchors handed out so far in one document.
#[derive(Debug, Default, Clone)]
pub struct AnchorRegistry {
    used: HashSet<String>,
}

impl AnchorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an anchor as taken without handing it out.
    pub fn reserve(&mut self, anchor: &str) {
        if !anchor.is_empty() {
            self.used.insert(anchor.to_string());
        }
    }

    /// Returns `anchor`, or the first free `anchor-N` (N >= 2), and marks it taken.
    pub fn claim(&mut self, anchor: &str) -> String {
        if self.used.insert(anchor.to_string()) {
            return anchor.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{anchor}-{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Rewrites every heading outside fenced code to `<hashes> <title> {#anchor}`.
///
/// The slug of `page_title` is reserved first because the site renders the
/// page title as a heading of its own. Headings whose text yields an empty
/// slug are left as they are.
#[must_use]
pub fn rewrite_heading_anchors(content: &str, page_title: &str) -> String {
    let mut registry = AnchorRegistry::new();
    registry.reserve(&slugify(page_title));

    map_prose_lines(content, |line| {
        let Some(heading) = Heading::parse(line) else {
            return line.to_string();
        };
        let anchor = heading.anchor();
        if anchor.is_empty() {
            return line.to_string();
        }
        let unique = registry.claim(&anchor);
        format!("{} {} {{#{}}}", "#".repeat(heading.level), heading.title, unique)
    })
}
