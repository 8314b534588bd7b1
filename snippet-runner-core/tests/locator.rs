// Integration tests for snippet discovery against real directories on disk.

use std::fs;
use std::path::Path;

use snippet_runner_core::contract::MockGraphQLExecutor;
use snippet_runner_core::{SnippetError, SnippetLocator};
use tempfile::tempdir;

fn write_snippet(root: &Path, name: &str, files: &[(&str, &str)]) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for (file, content) in files {
        fs::write(dir.join(file), content).unwrap();
    }
}

struct TestCase {
    name: &'static str,
    layout: Vec<(&'static str, Vec<(&'static str, &'static str)>)>,
    expected: Vec<&'static str>,
}

#[test]
fn test_list_finds_snippet_directories_table_driven() {
    let test_cases = vec![
        TestCase {
            name: "empty root",
            layout: vec![],
            expected: vec![],
        },
        TestCase {
            name: "sorted output regardless of creation order",
            layout: vec![
                ("search-components", vec![("search.graphql", "query S { a }")]),
                ("create-component", vec![("create.graphql", "mutation C { a }")]),
                ("get-user", vec![("get.graphql", "query G { a }")]),
            ],
            expected: vec!["create-component", "get-user", "search-components"],
        },
        TestCase {
            name: "directories without a document are not snippets",
            layout: vec![
                ("docs-only", vec![("README.md", "# nothing to run")]),
                ("get-user", vec![("get.graphql", "query G { a }"), ("README.md", "# hi")]),
            ],
            expected: vec!["get-user"],
        },
        TestCase {
            name: "hidden directories are ignored",
            layout: vec![
                (".git", vec![("x.graphql", "query X { a }")]),
                ("get-user", vec![("get.graphql", "query G { a }")]),
            ],
            expected: vec!["get-user"],
        },
    ];

    for case in test_cases {
        let root = tempdir().unwrap();
        for (dir, files) in &case.layout {
            write_snippet(root.path(), dir, files);
        }
        fs::write(root.path().join("stray.graphql"), "query Stray { a }").unwrap();

        let names = SnippetLocator::new(root.path()).list().unwrap();
        assert_eq!(names, case.expected, "case '{}'", case.name);
    }
}

#[test]
fn test_list_rescans_on_every_call() {
    let root = tempdir().unwrap();
    let locator = SnippetLocator::new(root.path());
    assert!(locator.list().unwrap().is_empty());

    write_snippet(root.path(), "late", &[("late.graphql", "query Late { a }")]);
    assert_eq!(locator.list().unwrap(), vec!["late"]);
}

#[test]
fn test_missing_root_is_configuration_error() {
    let root = tempdir().unwrap();
    let locator = SnippetLocator::new(root.path().join("does-not-exist"));
    assert!(matches!(locator.list(), Err(SnippetError::Configuration(_))));
}

#[test]
fn test_resolve_known_and_unknown_names() {
    let root = tempdir().unwrap();
    write_snippet(root.path(), "get-user", &[("get.graphql", "query G { a }")]);
    let locator = SnippetLocator::new(root.path());
    let client = MockGraphQLExecutor::new();

    let snippet = locator.resolve("get-user", &client).unwrap();
    assert_eq!(snippet.name(), "get-user");
    assert_eq!(snippet.path(), root.path().join("get-user"));

    for name in ["missing", "", "..", "../get-user", "get-user/..", "."] {
        assert!(
            matches!(locator.resolve(name, &client), Err(SnippetError::NotFound(_))),
            "expected NotFound for {name:?}"
        );
    }
}

#[test]
fn test_snippets_bind_every_listed_name() {
    let root = tempdir().unwrap();
    write_snippet(root.path(), "b", &[("b.graphql", "query B { a }")]);
    write_snippet(root.path(), "a", &[("a.graphql", "query A { a }")]);
    let client = MockGraphQLExecutor::new();

    let snippets = SnippetLocator::new(root.path()).snippets(&client).unwrap();
    let names: Vec<&str> = snippets.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
}
