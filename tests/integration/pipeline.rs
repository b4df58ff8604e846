//! Library-level generation across several repositories.

use livedocs::config::DocsConfig;
use livedocs::core::DocsError;
use livedocs::manifest::ExampleManifest;
use livedocs::pipeline::{GenerateOptions, Pipeline};
use livedocs::test_utils::{RepoFixture, ScriptedRunner, init_test_logging};
use std::path::Path;

const HELLO: &str = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hello\")\n}\n";

fn config_for(fixture: &RepoFixture, slugs: &[&str]) -> DocsConfig {
    let mut config = DocsConfig {
        docs_root: fixture.docs_dir(),
        cache_root: Some(fixture.state_dir()),
        manifest_path: Some(fixture.state_dir().join("examples.json")),
        checkout_root: Some(fixture.state_dir().join("repos")),
        repos: slugs.iter().map(|slug| fixture.repo_config(slug)).collect(),
        ..DocsConfig::default()
    };
    config.resolve_paths(None);
    config
}

fn readme() -> &'static str {
    "# Strings\n\nSee [the guide](docs/guide.md).\n\n## Hello\n\n<!-- example: hello -->\n```go\nfmt.Println(\"hello\")\n```\n\n## Unbound\n\n```go\nfmt.Println(\"nothing runs this\")\n```\n"
}

#[tokio::test]
async fn test_generate_binds_and_records_every_repo() {
    init_test_logging(None);
    let fixture = RepoFixture::new().unwrap();
    fixture.example("hello", HELLO).unwrap();
    fixture.readme(readme()).unwrap();

    let config = config_for(&fixture, &["str", "queue"]);
    let pipeline = Pipeline::with_runners(config, |_: &Path| {
        ScriptedRunner::new().with_output("hello", "hello\n", 0)
    });
    let report = pipeline.generate(&GenerateOptions::default()).await.unwrap();
    assert_eq!(report.succeeded.len(), 2);

    for slug in ["str", "queue"] {
        let page =
            std::fs::read_to_string(fixture.docs_dir().join(format!("libraries/{slug}.md"))).unwrap();
        assert!(page.starts_with("---\n"));
        assert!(page.contains(&format!("repoSlug: {slug}")));
        assert!(page.contains(&format!("https://github.com/goforj/{slug}/blob/main/docs/guide.md")));
        assert_eq!(page.matches("<LiveExample").count(), 1);
        assert!(page.contains("nothing runs this"));
    }

    let manifest = ExampleManifest::load(&fixture.state_dir().join("examples.json")).unwrap();
    assert_eq!(manifest.slugs().count(), 2);
    let record = manifest.get("queue", "hello").unwrap();
    assert_eq!(record.stdout, "hello\n");
    assert_eq!(record.exit_code, 0);
    assert_eq!(record.language, "go");
}

#[tokio::test]
async fn test_cached_results_survive_until_fresh() {
    let fixture = RepoFixture::new().unwrap();
    fixture.example("hello", HELLO).unwrap();
    fixture.readme(readme()).unwrap();

    let first = Pipeline::with_runners(config_for(&fixture, &["str"]), |_: &Path| {
        ScriptedRunner::new().with_output("hello", "first\n", 0)
    });
    first.generate(&GenerateOptions::default()).await.unwrap();

    let second = Pipeline::with_runners(config_for(&fixture, &["str"]), |_: &Path| {
        ScriptedRunner::new().with_output("hello", "second\n", 0)
    });
    second.generate(&GenerateOptions::default()).await.unwrap();
    let manifest = ExampleManifest::load(&fixture.state_dir().join("examples.json")).unwrap();
    assert_eq!(manifest.get("str", "hello").unwrap().stdout, "first\n");

    let fresh = GenerateOptions {
        repo: None,
        fresh: true,
    };
    second.generate(&fresh).await.unwrap();
    let manifest = ExampleManifest::load(&fixture.state_dir().join("examples.json")).unwrap();
    assert_eq!(manifest.get("str", "hello").unwrap().stdout, "second\n");
}

#[tokio::test]
async fn test_dependency_change_invalidates_cache() {
    let fixture = RepoFixture::new().unwrap();
    fixture.example("hello", HELLO).unwrap();
    fixture.readme(readme()).unwrap();

    let first = Pipeline::with_runners(config_for(&fixture, &["str"]), |_: &Path| {
        ScriptedRunner::new().with_output("hello", "first\n", 0)
    });
    first.generate(&GenerateOptions::default()).await.unwrap();

    fixture.file("go.mod", "module github.com/goforj/str\n\ngo 1.22\n").unwrap();
    let second = Pipeline::with_runners(config_for(&fixture, &["str"]), |_: &Path| {
        ScriptedRunner::new().with_output("hello", "second\n", 0)
    });
    second.generate(&GenerateOptions::default()).await.unwrap();

    let manifest = ExampleManifest::load(&fixture.state_dir().join("examples.json")).unwrap();
    assert_eq!(manifest.get("str", "hello").unwrap().stdout, "second\n");
}

#[tokio::test]
async fn test_single_repo_keeps_other_manifest_entries() {
    let fixture = RepoFixture::new().unwrap();
    fixture.example("hello", HELLO).unwrap();
    fixture.readme(readme()).unwrap();

    let pipeline = Pipeline::with_runners(config_for(&fixture, &["str", "queue"]), |_: &Path| {
        ScriptedRunner::new()
    });
    pipeline.generate(&GenerateOptions::default()).await.unwrap();

    let only_queue = GenerateOptions {
        repo: Some("queue".to_string()),
        fresh: true,
    };
    let report = pipeline.generate(&only_queue).await.unwrap();
    assert_eq!(report.total(), 1);

    let manifest = ExampleManifest::load(&fixture.state_dir().join("examples.json")).unwrap();
    assert!(manifest.get("str", "hello").is_some());
    assert!(manifest.get("queue", "hello").is_some());
}

#[tokio::test]
async fn test_failing_example_fails_its_repo() {
    let fixture = RepoFixture::new().unwrap();
    fixture.example("hello", HELLO).unwrap();
    fixture.readme(readme()).unwrap();

    let pipeline = Pipeline::with_runners(config_for(&fixture, &["str"]), |_: &Path| {
        ScriptedRunner::new().failing_on("hello")
    });
    let report = pipeline.generate(&GenerateOptions::default()).await.unwrap();
    assert!(report.succeeded.is_empty());
    assert!(report.manifest_path.is_none());

    let (slug, err) = &report.failed[0];
    assert_eq!(slug, "str");
    assert!(matches!(err.downcast_ref::<DocsError>(), Some(DocsError::BatchFailed { .. })));
    assert!(!fixture.docs_dir().join("libraries/str.md").exists());
}
