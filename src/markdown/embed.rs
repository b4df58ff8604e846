//! Binding of README code blocks to recorded example runs.
//!
//! The document is scanned top to bottom. Outside fenced code three kinds of
//! markers update the matching state:
//!
//! - a region comment `<!-- examples:start -->` (any `examples:` comment)
//!   clears both the current anchor and the current hint
//! - an anchor, either an inline `<a id="name"></a>` or any heading (its
//!   explicit anchor or its slug), sets the current anchor; headings also
//!   clear the hint
//! - a path hint such as `<!-- example: examples/basic/main.go -->` sets the
//!   current hint to the example id the path names
//!
//! When a fenced block in the example language closes, it is matched to at
//! most one unused result, trying in order: the hint, the anchor, then the
//! first unused result whose normalized source contains the block's
//! normalized content. A matched block is replaced by a `LiveExample` wrapper
//! holding the example's executable body. Unmatched blocks are copied
//! unchanged, and so is everything already inside a wrapper.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use super::Fence;
use super::anchors::Heading;
use crate::constants::EMBED_COMPONENT;
use crate::examples::{ExecutionResult, normalize_code};
use crate::manifest::ManifestRecord;

static REGION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<!--\s*examples:[^>]*-->\s*$").expect("valid regex"));

static INLINE_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\s+(?:id|name)="([^"]+)"\s*>\s*</a>"#).expect("valid regex"));

static PATH_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:<!--\s*)?example:\s*`?([^`\s]+?)`?\s*(?:-->)?\s*$").expect("valid regex")
});

static WRAPPER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*<{EMBED_COMPONENT}\b")).expect("valid regex"));

static WRAPPER_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*</{EMBED_COMPONENT}>")).expect("valid regex"));

/// Output of [`bind_examples`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDocument {
    /// Document with matched blocks wrapped.
    pub content: String,
    /// Records of the consumed results, keyed by example id.
    pub records: BTreeMap<String, ManifestRecord>,
}

/// Wraps every code block that can be resolved to an unused result.
///
/// `results` must be sorted by id. Each result is used at most once.
#[must_use]
pub fn bind_examples(
    content: &str,
    slug: &str,
    language: &str,
    results: &[ExecutionResult],
) -> BoundDocument {
    let mut binder = Binder::new(slug, language, results);
    for line in content.split('\n') {
        binder.feed(line);
    }
    binder.finish()
}

struct OpenBlock {
    fence: Fence,
    lines: Vec<String>,
}

struct Binder<'a> {
    slug: &'a str,
    language: String,
    results: &'a [ExecutionResult],
    used: HashSet<usize>,
    anchor: Option<String>,
    hint: Option<String>,
    in_wrapper: bool,
    block: Option<OpenBlock>,
    out: Vec<String>,
    records: BTreeMap<String, ManifestRecord>,
}

impl<'a> Binder<'a> {
    fn new(slug: &'a str, language: &str, results: &'a [ExecutionResult]) -> Self {
        Self {
            slug,
            language: language.to_ascii_lowercase(),
            results,
            used: HashSet::new(),
            anchor: None,
            hint: None,
            in_wrapper: false,
            block: None,
            out: Vec::new(),
            records: BTreeMap::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        if let Some(mut block) = self.block.take() {
            if block.fence.closes(line) {
                block.lines.push(line.to_string());
                self.close_block(block);
            } else {
                block.lines.push(line.to_string());
                self.block = Some(block);
            }
            return;
        }

        if let Some(fence) = Fence::open(line) {
            self.block = Some(OpenBlock {
                fence,
                lines: vec![line.to_string()],
            });
            return;
        }

        self.observe_prose(line);
        self.out.push(line.to_string());
    }

    fn observe_prose(&mut self, line: &str) {
        if WRAPPER_OPEN.is_match(line) {
            self.in_wrapper = true;
        }
        if WRAPPER_CLOSE.is_match(line) {
            self.in_wrapper = false;
        }

        if REGION_MARKER.is_match(line) {
            self.anchor = None;
            self.hint = None;
            return;
        }
        if let Some(caps) = PATH_HINT.captures(line) {
            self.hint = example_id_from_path(&caps[1]);
            return;
        }
        if let Some(heading) = Heading::parse(line) {
            let anchor = heading.anchor();
            self.anchor = (!anchor.is_empty()).then_some(anchor);
            self.hint = None;
            return;
        }
        if let Some(caps) = INLINE_ANCHOR.captures(line) {
            self.anchor = Some(caps[1].to_string());
        }
    }

    fn close_block(&mut self, block: OpenBlock) {
        let is_example_language = block.fence.language() == self.language;
        if !is_example_language || self.in_wrapper {
            self.out.extend(block.lines);
            return;
        }

        let hint = self.hint.take();
        let body = block.lines[1..block.lines.len() - 1].join("\n");
        match self.resolve(&normalize_code(&body), hint.as_deref()) {
            Some(index) => {
                self.used.insert(index);
                let result = &self.results[index];
                tracing::debug!(target: "markdown", "Embedding example '{}'", result.id);
                self.out.push(self.wrapper(result));
                self.records.insert(result.id.clone(), ManifestRecord::from_result(result, &self.language));
            }
            None => self.out.extend(block.lines),
        }
    }

    fn resolve(&self, normalized_block: &str, hint: Option<&str>) -> Option<usize> {
        let by_id = |id: &str| {
            self.results.iter().enumerate().position(|(i, r)| r.id == id && !self.used.contains(&i))
        };

        if let Some(index) = hint.and_then(by_id) {
            return Some(index);
        }
        if let Some(index) = self.anchor.as_deref().and_then(by_id) {
            return Some(index);
        }
        if normalized_block.is_empty() {
            return None;
        }
        self.results
            .iter()
            .enumerate()
            .position(|(i, r)| !self.used.contains(&i) && r.normalized.contains(normalized_block))
    }

    fn wrapper(&self, result: &ExecutionResult) -> String {
        format!(
            "<{tag} repo=\"{slug}\" example=\"{id}\">\n\n```{lang}\n{body}\n```\n\n</{tag}>",
            tag = EMBED_COMPONENT,
            slug = self.slug,
            id = result.id,
            lang = self.language,
            body = executable_body(&result.source),
        )
    }

    fn finish(mut self) -> BoundDocument {
        // An unterminated fence runs to the end of the document.
        if let Some(block) = self.block.take() {
            self.out.extend(block.lines);
        }
        BoundDocument {
            content: self.out.join("\n"),
            records: self.records,
        }
    }
}

/// Maps a hinted path to an example id.
///
/// A path ending in a file (`examples/basic/main.go`) names its parent
/// directory; any other path names its last segment.
fn example_id_from_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    let last = segments.last()?;
    if last.contains('.') {
        segments.len().checked_sub(2).map(|i| segments[i].to_string())
    } else {
        Some((*last).to_string())
    }
}

/// The part of an example program worth showing in documentation.
///
/// Strips leading build directives, the package clause, imports, a leading
/// comment block and blank lines. When only `func main` remains, its body is
/// shown instead of the function. Common indentation is removed.
#[must_use]
pub fn executable_body(source: &str) -> String {
    let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.lines().collect();

    let mut start = 0;
    let mut in_import_block = false;
    let mut in_block_comment = false;
    while start < lines.len() {
        let trimmed = lines[start].trim();
        if in_import_block {
            in_import_block = trimmed != ")";
        } else if in_block_comment {
            in_block_comment = !trimmed.contains("*/");
        } else if trimmed.starts_with("import (") || trimmed == "import(" {
            in_import_block = true;
        } else if trimmed.starts_with("/*") {
            in_block_comment = !trimmed.contains("*/");
        } else if !(trimmed.is_empty()
            || trimmed.starts_with("//")
            || trimmed.starts_with("package ")
            || trimmed.starts_with("import "))
        {
            break;
        }
        start += 1;
    }

    let mut rest: Vec<&str> = lines[start..].to_vec();
    while rest.last().is_some_and(|line| line.trim().is_empty()) {
        rest.pop();
    }

    if let Some(inner) = main_body(&rest) {
        rest = inner;
    }
    dedent(&rest)
}

/// The lines inside `func main() { ... }` when that function is all there is.
fn main_body<'a>(lines: &[&'a str]) -> Option<Vec<&'a str>> {
    let first = lines.first()?.trim();
    let last = lines.last()?;
    if lines.len() < 2 || !first.starts_with("func main()") || !first.ends_with('{') || *last != "}" {
        return None;
    }
    // A second top-level closing brace means more than one declaration.
    if lines[1..lines.len() - 1].iter().any(|line| *line == "}") {
        return None;
    }
    let mut inner = lines[1..lines.len() - 1].to_vec();
    while inner.first().is_some_and(|line| line.trim().is_empty()) {
        inner.remove(0);
    }
    Some(inner)
}

/// Removes the longest run of leading spaces and tabs shared by every
/// non-blank line. Other whitespace is content.
fn dedent(lines: &[&str]) -> String {
    let prefix = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let rest = line.trim_start_matches([' ', '\t']);
            &line[..line.len() - rest.len()]
        })
        .reduce(|shared, indent| {
            let common = shared.bytes().zip(indent.bytes()).take_while(|(a, b)| a == b).count();
            &shared[..common]
        })
        .unwrap_or("");
    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() { "" } else { line.strip_prefix(prefix).unwrap_or(line) }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
