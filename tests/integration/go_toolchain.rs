//! Real `go run` executions.
//!
//! Skipped when no Go toolchain is on `PATH`.

use livedocs::config::DocsConfig;
use livedocs::manifest::ExampleManifest;
use livedocs::pipeline::{GenerateOptions, Pipeline};
use livedocs::test_utils::RepoFixture;
use livedocs::utils::command_exists;

fn go_fixture() -> Option<RepoFixture> {
    if !command_exists("go") {
        eprintln!("go not found on PATH, skipping");
        return None;
    }
    let fixture = RepoFixture::new().unwrap();
    fixture.file("go.mod", "module example.com/str\n\ngo 1.21\n").unwrap();
    Some(fixture)
}

fn config_for(fixture: &RepoFixture) -> DocsConfig {
    let mut config = DocsConfig {
        docs_root: fixture.docs_dir(),
        cache_root: Some(fixture.state_dir()),
        manifest_path: Some(fixture.state_dir().join("examples.json")),
        checkout_root: Some(fixture.state_dir().join("repos")),
        repos: vec![fixture.repo_config("str")],
        ..DocsConfig::default()
    };
    config.resolve_paths(None);
    config
}

#[tokio::test]
async fn test_go_examples_record_output_and_exit_codes() {
    let Some(fixture) = go_fixture() else {
        return;
    };
    fixture
        .example(
            "hello",
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hello\")\n}\n",
        )
        .unwrap();
    fixture
        .example(
            "exit",
            "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\nfunc main() {\n\tfmt.Fprintln(os.Stderr, \"boom\")\n\tos.Exit(3)\n}\n",
        )
        .unwrap();
    fixture
        .example(
            "ignored",
            "//go:build ignore\n\npackage main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"isolated\")\n}\n",
        )
        .unwrap();
    fixture
        .readme(concat!(
            "# Str\n\n## hello\n\n```go\nfmt.Println(\"hello\")\n```\n\n",
            "## exit\n\n```go\nfmt.Fprintln(os.Stderr, \"boom\")\nos.Exit(3)\n```\n\n",
            "<!-- example: examples/ignored/main.go -->\n```go\nfmt.Println(\"isolated\")\n```\n",
        ))
        .unwrap();

    let report = Pipeline::new(config_for(&fixture)).generate(&GenerateOptions::default()).await.unwrap();
    assert_eq!(report.succeeded.len(), 1, "{:?}", report.failed);
    assert_eq!(report.succeeded[0].records.len(), 3);

    let manifest = ExampleManifest::load(&fixture.state_dir().join("examples.json")).unwrap();
    assert_eq!(manifest.get("str", "hello").unwrap().stdout, "hello\n");
    assert_eq!(manifest.get("str", "ignored").unwrap().stdout, "isolated\n");

    let exit = manifest.get("str", "exit").unwrap();
    assert_eq!(exit.exit_code, 3);
    assert!(exit.stdout.contains("boom"));

    let leftovers: Vec<_> = walkdir::WalkDir::new(fixture.repo_dir())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("livedocs_"))
        .collect();
    assert!(leftovers.is_empty());
}
