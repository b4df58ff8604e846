//! Canonical form of example source used for content matching.

/// Normalizes source text for comparison.
///
/// Line endings become `\n`, every line is trimmed of surrounding whitespace,
/// and leading and trailing blank lines are dropped. Trimming both sides of a
/// line makes documentation snippets, which are usually shown without the
/// indentation they have inside a function body, comparable with the full
/// program. The function is idempotent.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    let unified = code.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = unified.split('\n').map(str::trim).collect();
    lines.join("\n").trim().to_string()
}
