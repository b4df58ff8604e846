//! Absolute URLs for images and links.
//!
//! A README is written to be read inside its repository, so its relative
//! references break once the page is published elsewhere. Images point at
//! the raw-content host; links point at the repository's web view.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::map_prose_lines;

static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").expect("valid regex"));

static HTML_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).expect("valid regex"));

/// `[text](target "title")`, where the text may itself hold an image (badges).
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[((?:[^\[\]]|!\[[^\]]*\]\([^)]*\))*)\]\(([^)\s]*)((?:\s+"[^"]*")?)\)"#)
        .expect("valid regex")
});

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

/// Rewrites relative image sources, in markdown and raw HTML, against `raw_base`.
///
/// Absolute URLs, data URIs and fragment references pass through. Images
/// inside code blocks are rewritten too; they are rendered as text anyway.
#[must_use]
pub fn rewrite_images(content: &str, raw_base: &str) -> String {
    let content = replace_group(&MARKDOWN_IMAGE, content, |url| rewrite_image_url(url, raw_base));
    replace_group(&HTML_IMAGE, &content, |url| rewrite_image_url(url, raw_base))
}

/// Rewrites relative link targets outside fenced code against `web_base`.
///
/// Targets whose last segment contains a dot are files (`blob`), anything
/// else is a directory (`tree`). Fragments are kept.
#[must_use]
pub fn rewrite_links(content: &str, web_base: &str, branch: &str) -> String {
    map_prose_lines(content, |line| {
        MARKDOWN_LINK
            .replace_all(line, |caps: &Captures<'_>| {
                if !caps[1].is_empty() {
                    return caps[0].to_string();
                }
                format!("[{}]({}{})", &caps[2], rewrite_link_url(&caps[3], web_base, branch), &caps[4])
            })
            .into_owned()
    })
}

fn replace_group(regex: &Regex, content: &str, rewrite: impl Fn(&str) -> String) -> String {
    regex
        .replace_all(content, |caps: &Captures<'_>| {
            let (Some(whole), Some(group)) = (caps.get(0), caps.get(1)) else {
                return caps[0].to_string();
            };
            let text = whole.as_str();
            let start = group.start() - whole.start();
            let end = group.end() - whole.start();
            format!("{}{}{}", &text[..start], rewrite(group.as_str()), &text[end..])
        })
        .into_owned()
}

fn is_passthrough(url: &str) -> bool {
    url.is_empty() || url.starts_with('#') || url.starts_with("//") || URL_SCHEME.is_match(url)
}

fn rewrite_image_url(url: &str, raw_base: &str) -> String {
    let trimmed = url.trim();
    if is_passthrough(trimmed) {
        return trimmed.to_string();
    }
    format!("{raw_base}{}", strip_relative_prefix(trimmed))
}

fn rewrite_link_url(url: &str, web_base: &str, branch: &str) -> String {
    let trimmed = url.trim();
    if is_passthrough(trimmed) {
        return trimmed.to_string();
    }

    let (path, fragment) = match trimmed.find('#') {
        Some(index) => trimmed.split_at(index),
        None => (trimmed, ""),
    };
    let path = strip_relative_prefix(path);
    if path.is_empty() {
        return trimmed.to_string();
    }

    let leaf = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    let mode = if leaf.contains('.') && !path.ends_with('/') { "blob" } else { "tree" };
    format!("{web_base}{mode}/{branch}/{path}{fragment}")
}

fn strip_relative_prefix(path: &str) -> &str {
    let path = path.strip_prefix("./").unwrap_or(path);
    path.trim_start_matches('/')
}
