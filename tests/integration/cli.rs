//! The `livedocs` binary against a shell toolchain.
//!
//! `sh -c` stands in for `go run`, so these tests only need a POSIX shell.

use assert_cmd::Command;
use livedocs::constants::MANIFEST_PATH_ENV;
use livedocs::test_utils::RepoFixture;
use predicates::prelude::*;
use std::path::PathBuf;

const HELLO: &str = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hello\")\n}\n";

struct CliFixture {
    repo: RepoFixture,
}

impl CliFixture {
    fn new() -> Self {
        let repo = RepoFixture::new().unwrap();
        repo.example("hello", HELLO).unwrap();
        repo.readme("# Str\n\n## Hello\n\n```go\nfmt.Println(\"hello\")\n```\n").unwrap();
        let config = r#"docs_root = "docs"
cache_root = "state"
manifest_path = "state/examples.json"
checkout_root = "state/repos"

[toolchain]
program = "sh"
run_args = ["-c", "echo hello; echo 'go: downloading example.com/dep v1.0.0' >&2", "runner"]

[[repos]]
slug = "str"
title = "Strings"
source_url = "https://github.com/goforj/str.git"
output_path = "libraries/str.md"
local_path = "repo"
"#;
        std::fs::write(repo.root().join("livedocs.toml"), config).unwrap();
        Self {
            repo,
        }
    }

    fn config_path(&self) -> PathBuf {
        self.repo.root().join("livedocs.toml")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("livedocs").unwrap();
        cmd.env_remove(MANIFEST_PATH_ENV)
            .env_remove("RUST_LOG")
            .current_dir(self.repo.root())
            .arg("--no-progress")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("livedocs")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("show"));
}

#[cfg(unix)]
#[test]
fn test_generate_then_show() {
    let fixture = CliFixture::new();

    fixture
        .cmd()
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("str"))
        .stdout(predicate::str::contains("1 of 1 examples embedded"));

    let page = std::fs::read_to_string(fixture.repo.root().join("docs/libraries/str.md")).unwrap();
    assert!(page.contains("title: Strings"));
    assert!(page.contains("<LiveExample repo=\"str\" example=\"hello\">"));

    fixture
        .cmd()
        .args(["show", "str", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stdout\": \"hello\\n\""))
        .stdout(predicate::str::contains("\"exitCode\": 0"))
        .stdout(predicate::str::contains("go: downloading").not());
}

#[cfg(unix)]
#[test]
fn test_show_unknown_example_fails() {
    let fixture = CliFixture::new();
    fixture.cmd().arg("generate").assert().success();

    fixture
        .cmd()
        .args(["show", "str", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Example 'missing' not found for repository 'str'"));
}

#[test]
fn test_unknown_repo_fails() {
    let fixture = CliFixture::new();
    fixture
        .cmd()
        .args(["generate", "--repo", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown repository 'nope'"));
}

#[test]
fn test_missing_config_fails() {
    let fixture = CliFixture::new();
    Command::cargo_bin("livedocs")
        .unwrap()
        .current_dir(fixture.repo.root())
        .args(["--config", "absent.toml", "generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.toml"))
        .stderr(predicate::str::contains("Failed to generate docs").not());
}

#[cfg(unix)]
#[test]
fn test_manifest_env_override() {
    let fixture = CliFixture::new();
    let custom = fixture.repo.root().join("custom/examples.json");

    fixture.cmd().env(MANIFEST_PATH_ENV, &custom).arg("generate").assert().success();
    assert!(custom.exists());
    assert!(!fixture.repo.root().join("state/examples.json").exists());

    fixture
        .cmd()
        .env(MANIFEST_PATH_ENV, &custom)
        .args(["show", "str", "hello"])
        .assert()
        .success();
}
