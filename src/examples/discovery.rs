//! Discovery of example programs below an examples directory.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

use super::ExampleUnit;
use crate::core::DocsError;

/// Collects every example under `examples_dir`.
///
/// A file named `entry_point` is one example; its id is the name of the
/// directory that contains it. A missing examples directory yields no
/// examples. Failing to read a discovered entry point aborts discovery, as
/// does finding two examples with the same id.
///
/// Units are returned sorted by id.
pub fn discover_examples(examples_dir: &Path, entry_point: &str) -> Result<Vec<ExampleUnit>> {
    if !examples_dir.exists() {
        tracing::debug!(
            target: "examples",
            "No examples directory at {}",
            examples_dir.display()
        );
        return Ok(Vec::new());
    }

    let mut units = Vec::new();
    let mut seen: HashMap<String, std::path::PathBuf> = HashMap::new();

    for entry in WalkDir::new(examples_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| {
            format!("Failed to walk examples directory: {}", examples_dir.display())
        })?;
        if !entry.file_type().is_file() || entry.file_name() != entry_point {
            continue;
        }

        let path = entry.path();
        let Some(id) = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
        else {
            continue;
        };

        let source = std::fs::read_to_string(path).map_err(|e| DocsError::ExampleRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if let Some(previous) = seen.insert(id.clone(), path.to_path_buf()) {
            anyhow::bail!(
                "Duplicate example id '{}': {} and {}",
                id,
                previous.display(),
                path.display()
            );
        }

        tracing::trace!(target: "examples", "Discovered example '{}' at {}", id, path.display());
        units.push(ExampleUnit::new(id, path, source));
    }

    units.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_directory_is_empty() {
        let temp = tempdir().unwrap();
        let units = discover_examples(&temp.path().join("examples"), "main.go").unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn test_discovers_nested_examples_sorted() {
        let temp = tempdir().unwrap();
        let examples = temp.path().join("examples");
        fs::create_dir_all(examples.join("zeta")).unwrap();
        fs::create_dir_all(examples.join("group/alpha")).unwrap();
        fs::write(examples.join("zeta/main.go"), "package main\r\n").unwrap();
        fs::write(examples.join("group/alpha/main.go"), "package main\n").unwrap();
        fs::write(examples.join("group/alpha/helper.go"), "package main\n").unwrap();
        fs::write(examples.join("README.md"), "# examples").unwrap();

        let units = discover_examples(&examples, "main.go").unwrap();
        let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
        assert_eq!(units[1].source, "package main\r\n");
        assert_eq!(units[1].normalized, "package main");
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let temp = tempdir().unwrap();
        let examples = temp.path().join("examples");
        fs::create_dir_all(examples.join("a/basic")).unwrap();
        fs::create_dir_all(examples.join("b/basic")).unwrap();
        fs::write(examples.join("a/basic/main.go"), "").unwrap();
        fs::write(examples.join("b/basic/main.go"), "").unwrap();

        let err = discover_examples(&examples, "main.go").unwrap_err();
        assert!(err.to_string().contains("Duplicate example id 'basic'"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entry_point_is_fatal() {
        let temp = tempdir().unwrap();
        let examples = temp.path().join("examples");
        fs::create_dir_all(examples.join("broken")).unwrap();
        // Invalid UTF-8 cannot be read as text.
        fs::write(examples.join("broken/main.go"), [0xff, 0xfe, 0x00]).unwrap();

        let err = discover_examples(&examples, "main.go").unwrap_err();
        assert!(matches!(err.downcast_ref::<DocsError>(), Some(DocsError::ExampleRead { .. })));
    }

    #[test]
    fn test_entry_point_in_examples_root_uses_directory_name() {
        let temp = tempdir().unwrap();
        let examples = temp.path().join("examples");
        fs::create_dir_all(examples.join("basic")).unwrap();
        fs::write(examples.join("main.go"), "package main\n").unwrap();
        fs::write(examples.join("basic/main.go"), "package main\n").unwrap();

        let units = discover_examples(&examples, "main.go").unwrap();
        let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["basic", "examples"]);
        assert_eq!(units[1].path, examples.join("main.go"));
    }
}
