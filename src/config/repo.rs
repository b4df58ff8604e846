//! Static description of one documented repository.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_branch() -> String {
    "main".to_string()
}

fn default_readme() -> String {
    "README.md".to_string()
}

/// One repository whose README becomes a documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Short identifier, unique across the configuration.
    pub slug: String,

    /// Display title of the generated page; falls back to the slug.
    #[serde(default)]
    pub title: String,

    /// Clone URL of the repository.
    pub source_url: String,

    /// Branch the checkout tracks.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Output document path, relative to the docs root.
    pub output_path: PathBuf,

    /// Use an existing checkout instead of syncing one.
    #[serde(default)]
    pub local_path: Option<PathBuf>,

    /// Base for rewritten image URLs; derived from `source_url` when unset.
    #[serde(default)]
    pub raw_base: Option<String>,

    /// Base for rewritten link URLs; derived from `source_url` when unset.
    #[serde(default)]
    pub web_base: Option<String>,

    /// Documentation file read from the checkout root.
    #[serde(default = "default_readme")]
    pub readme: String,
}

impl RepoConfig {
    /// Creates a configuration with defaults for everything but the essentials.
    pub fn new(
        slug: impl Into<String>,
        source_url: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: String::new(),
            source_url: source_url.into(),
            branch: default_branch(),
            output_path: output_path.into(),
            local_path: None,
            raw_base: None,
            web_base: None,
            readme: default_readme(),
        }
    }

    /// Display title, falling back to the slug.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() { &self.slug } else { &self.title }
    }

    /// Repository web URL (source URL without a trailing `.git`).
    #[must_use]
    pub fn repo_url(&self) -> &str {
        let url = self.source_url.trim_end_matches('/');
        url.strip_suffix(".git").unwrap_or(url)
    }

    /// Web base ending in `/`, e.g. `https://github.com/goforj/str/`.
    #[must_use]
    pub fn web_base(&self) -> String {
        ensure_trailing_slash(self.web_base.as_deref().unwrap_or_else(|| self.repo_url()))
    }

    /// Raw-content base ending in `/`.
    ///
    /// GitHub URLs map to `raw.githubusercontent.com/<owner>/<repo>/<branch>/`;
    /// other hosts use `<repo_url>/raw/<branch>/`.
    #[must_use]
    pub fn raw_base(&self) -> String {
        if let Some(base) = &self.raw_base {
            return ensure_trailing_slash(base);
        }
        let url = self.repo_url();
        match url.strip_prefix("https://github.com/").or_else(|| url.strip_prefix("http://github.com/")) {
            Some(path) => ensure_trailing_slash(&format!(
                "https://raw.githubusercontent.com/{path}/{}",
                self.branch
            )),
            None => ensure_trailing_slash(&format!("{url}/raw/{}", self.branch)),
        }
    }
}

fn ensure_trailing_slash(value: &str) -> String {
    if value.ends_with('/') { value.to_string() } else { format!("{value}/") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_bases() {
        let repo = RepoConfig::new("str", "https://github.com/goforj/str.git", "libraries/str.md");
        assert_eq!(repo.repo_url(), "https://github.com/goforj/str");
        assert_eq!(repo.web_base(), "https://github.com/goforj/str/");
        assert_eq!(repo.raw_base(), "https://raw.githubusercontent.com/goforj/str/main/");
    }

    #[test]
    fn test_overrides_and_other_hosts() {
        let mut repo = RepoConfig::new("x", "https://git.example.com/team/x.git", "x.md");
        assert_eq!(repo.raw_base(), "https://git.example.com/team/x/raw/main/");
        repo.raw_base = Some("https://cdn.example.com/x".to_string());
        assert_eq!(repo.raw_base(), "https://cdn.example.com/x/");
    }

    #[test]
    fn test_display_title_falls_back_to_slug() {
        let mut repo = RepoConfig::new("env", "https://github.com/goforj/env.git", "env.md");
        assert_eq!(repo.display_title(), "env");
        repo.title = "Env".to_string();
        assert_eq!(repo.display_title(), "Env");
    }
}
