//! Unit tests for trellis-indexer

use crate::*;
use std::path::PathBuf;
use trellis_core::{EdgeKind, NodeKind};

fn accounts_file() -> ParsedFile {
    ParsedFile::new("elixir")
        .symbol(Symbol::module("Accounts", 1))
        .symbol(Symbol::function("get_user", 4, 1))
        .symbol(Symbol::function("list_users", 9, 0).private())
        .symbol(Symbol::module("Accounts.Admin", 20))
        .symbol(Symbol::function("ban", 22, 1))
        .symbol(Symbol::class("UserStruct", 30))
        .reference(Reference::import("Repo", 2))
        .reference(Reference::new(ReferenceKind::Alias, "Accounts.User", 3))
        .reference(Reference::new(ReferenceKind::Use, "Ecto.Schema", 21))
}

#[test]
fn test_file_and_module_nodes() {
    let mut builder = GraphBuilder::new();
    let report = builder.add_from_parsed("lib/accounts.ex", &accounts_file());
    let graph = builder.store();

    let file = graph.get_node("lib/accounts.ex").unwrap();
    assert_eq!(file.kind, NodeKind::File);
    assert_eq!(file.name, "accounts.ex");
    assert_eq!(file.metadata.get("language").map(String::as_str), Some("elixir"));

    assert_eq!(graph.kind_of("Accounts"), Some(NodeKind::Module));
    assert!(graph.has_edge_between("lib/accounts.ex", "Accounts", EdgeKind::Defines));
    assert!(graph.has_edge_between("lib/accounts.ex", "Accounts.Admin", EdgeKind::Defines));

    assert_eq!(report.modules, 2);
    assert_eq!(report.functions, 3);
    assert_eq!(report.classes, 1);
    assert_eq!(report.references, 3);
    assert_eq!(report.dropped_references, 0);
}

#[test]
fn test_functions_scoped_to_preceding_module() {
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("lib/accounts.ex", &accounts_file());
    let graph = builder.store();

    assert_eq!(
        graph.functions_of("Accounts"),
        vec!["Accounts.get_user/1", "Accounts.list_users/0"]
    );
    assert_eq!(graph.functions_of("Accounts.Admin"), vec!["Accounts.Admin.ban/1"]);

    let private = graph.get_node("Accounts.list_users/0").unwrap();
    assert_eq!(private.metadata.get("visibility").map(String::as_str), Some("private"));
    assert_eq!(private.metadata.get("arity").map(String::as_str), Some("0"));

    let symbols = builder.symbols();
    assert_eq!(
        symbols.lookup_unique("ban/1"),
        Some("Accounts.Admin.ban/1".to_string())
    );
    assert_eq!(symbols.symbols_in_file("lib/accounts.ex").len(), 3);
}

#[test]
fn test_function_without_module_attaches_to_file() {
    let parsed = ParsedFile::new("python")
        .symbol(Symbol::function("main", 1, 0))
        .symbol(Symbol::module("late", 10))
        .symbol(Symbol::function("helper", 12, 2));
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("main.py", &parsed);
    let graph = builder.store();

    assert!(graph.has_edge_between("main.py", "main/0", EdgeKind::Defines));
    assert!(graph.has_edge_between("late", "late.helper/2", EdgeKind::Defines));
    // File-level functions are reachable through Defines but not functions_of a module.
    assert!(graph.functions_of("late").contains(&"late.helper/2".to_string()));
}

#[test]
fn test_missing_arity_defaults_to_zero() {
    let mut symbol = Symbol::function("run", 3, 0);
    symbol.arity = None;
    let parsed = ParsedFile::new("elixir")
        .symbol(Symbol::module("Task", 1))
        .symbol(symbol);
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("task.ex", &parsed);

    assert!(builder.store().contains_node("Task.run/0"));
}

#[test]
fn test_classes_defined_by_file() {
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("lib/accounts.ex", &accounts_file());
    let graph = builder.store();

    assert_eq!(graph.kind_of("UserStruct"), Some(NodeKind::Class));
    assert!(graph.has_edge_between("lib/accounts.ex", "UserStruct", EdgeKind::Defines));
}

#[test]
fn test_references_create_external_targets() {
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("lib/accounts.ex", &accounts_file());
    let graph = builder.store();

    assert_eq!(graph.kind_of("Repo"), Some(NodeKind::External));
    assert!(graph.has_edge_between("Accounts", "Repo", EdgeKind::Imports));
    assert!(graph.has_edge_between("Accounts", "Accounts.User", EdgeKind::Alias));
    assert!(graph.has_edge_between("Accounts.Admin", "Ecto.Schema", EdgeKind::Uses));
    assert_eq!(graph.imports_of("Accounts"), vec!["Accounts.User", "Repo"]);
}

#[test]
fn test_reference_to_known_module_keeps_its_kind() {
    let repo = ParsedFile::new("elixir").symbol(Symbol::module("Repo", 1));
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("lib/repo.ex", &repo);
    builder.add_from_parsed("lib/accounts.ex", &accounts_file());

    assert_eq!(builder.store().kind_of("Repo"), Some(NodeKind::Module));
    assert_eq!(builder.store().imported_by("Repo"), vec!["Accounts"]);
}

#[test]
fn test_later_module_definition_replaces_placeholder() {
    let repo = ParsedFile::new("elixir").symbol(Symbol::module("Repo", 1));
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("lib/accounts.ex", &accounts_file());
    builder.add_from_parsed("lib/repo.ex", &repo);

    assert_eq!(builder.store().kind_of("Repo"), Some(NodeKind::Module));
    assert_eq!(builder.store().imported_by("Repo"), vec!["Accounts"]);
}

#[test]
fn test_reference_before_any_module_is_dropped() {
    let parsed = ParsedFile::new("elixir")
        .reference(Reference::import("Logger", 1))
        .symbol(Symbol::module("App", 5))
        .reference(Reference::import("Config", 6));
    let mut builder = GraphBuilder::new();
    let report = builder.add_from_parsed("app.ex", &parsed);
    let graph = builder.store();

    assert_eq!(report.dropped_references, 1);
    assert_eq!(report.references, 1);
    assert!(!graph.contains_node("Logger"));
    assert_eq!(graph.imports_of("App"), vec!["Config"]);
    // file node, App, Config
    assert_eq!(graph.node_count(), 3);
}

#[test]
fn test_same_line_modules_prefer_later_declaration() {
    let parsed = ParsedFile::new("elixir")
        .symbol(Symbol::module("Outer", 1))
        .symbol(Symbol::module("Inner", 1))
        .symbol(Symbol::function("go", 2, 0));
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("nested.ex", &parsed);

    assert!(builder.store().contains_node("Inner.go/0"));
}

#[test]
fn test_ingestion_never_creates_call_edges_without_resolution() {
    let parsed = ParsedFile::new("elixir")
        .symbol(Symbol::module("A", 1))
        .symbol(Symbol::function("f", 2, 0))
        .call(CallSite::local("g", 0, 3));
    let mut builder = GraphBuilder::new();
    let report = builder.add_from_parsed("a.ex", &parsed);

    assert_eq!(report.call_sites, 1);
    assert_eq!(builder.pending_calls(), 1);
    assert_eq!(builder.store().stats().edges_by_type.get(&EdgeKind::Calls), None);
}

fn call_fixture() -> (ParsedFile, ParsedFile) {
    let accounts = ParsedFile::new("elixir")
        .symbol(Symbol::module("Accounts", 1))
        .symbol(Symbol::function("get_user", 2, 1))
        .symbol(Symbol::function("fetch", 8, 1))
        .call(CallSite::local("fetch", 1, 3))
        .call(CallSite::remote("Repo", "get", 2, 4))
        .call(CallSite::local("log", 1, 5))
        .call(CallSite::remote("Enum", "map", 2, 9));
    let repo = ParsedFile::new("elixir")
        .symbol(Symbol::module("Repo", 1))
        .symbol(Symbol::function("get", 2, 2))
        .symbol(Symbol::function("fetch", 6, 1))
        .symbol(Symbol::module("Audit", 10))
        .symbol(Symbol::function("log", 11, 1));
    (accounts, repo)
}

#[test]
fn test_resolve_calls_across_files() {
    let (accounts, repo) = call_fixture();
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("accounts.ex", &accounts);
    builder.add_from_parsed("repo.ex", &repo);
    let outcome = builder.resolve_calls();
    let graph = builder.store();

    // Same-module fetch wins over the Repo.fetch/1 with the same key.
    assert_eq!(
        graph.callees("Accounts.get_user/1"),
        vec!["Accounts.fetch/1", "Audit.log/1", "Repo.get/2"]
    );
    assert_eq!(graph.callees("Accounts.fetch/1"), vec!["Enum.map/2"]);
    assert_eq!(graph.kind_of("Enum.map/2"), Some(NodeKind::External));
    assert_eq!(outcome, CallResolution { resolved: 3, unresolved: 1 });
    assert_eq!(builder.pending_calls(), 0);
}

#[test]
fn test_ambiguous_unqualified_call_is_external() {
    let caller = ParsedFile::new("elixir")
        .symbol(Symbol::module("Web", 1))
        .symbol(Symbol::function("show", 2, 0))
        .call(CallSite::local("fetch", 1, 3));
    let (_, repo) = call_fixture();
    let other = ParsedFile::new("elixir")
        .symbol(Symbol::module("Cache", 1))
        .symbol(Symbol::function("fetch", 2, 1));

    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("web.ex", &caller);
    builder.add_from_parsed("repo.ex", &repo);
    builder.add_from_parsed("cache.ex", &other);
    let outcome = builder.resolve_calls();

    assert_eq!(builder.store().callees("Web.show/0"), vec!["fetch/1"]);
    assert_eq!(builder.store().kind_of("fetch/1"), Some(NodeKind::External));
    assert_eq!(outcome.unresolved, 1);
}

#[test]
fn test_call_before_any_function_is_dropped() {
    let parsed = ParsedFile::new("elixir")
        .symbol(Symbol::module("A", 1))
        .call(CallSite::local("setup", 0, 2))
        .symbol(Symbol::function("f", 5, 0));
    let mut builder = GraphBuilder::new();
    let report = builder.add_from_parsed("a.ex", &parsed);

    assert_eq!(report.dropped_call_sites, 1);
    assert_eq!(builder.resolve_calls().total(), 0);
}

#[test]
fn test_duplicate_call_sites_keep_both_edges() {
    let parsed = ParsedFile::new("elixir")
        .symbol(Symbol::module("A", 1))
        .symbol(Symbol::function("f", 2, 0))
        .symbol(Symbol::function("g", 9, 0))
        .call(CallSite::local("g", 0, 3))
        .call(CallSite::local("g", 0, 4));
    let mut builder = GraphBuilder::new();
    builder.add_from_parsed("a.ex", &parsed);
    builder.resolve_calls();
    let graph = builder.store();

    assert_eq!(graph.stats().edges_by_type.get(&EdgeKind::Calls), Some(&2));
    assert_eq!(graph.callees("A.f/0"), vec!["A.g/0"]);

    // Queue is drained, a second pass adds nothing.
    builder.resolve_calls();
    assert_eq!(builder.store().stats().edges_by_type.get(&EdgeKind::Calls), Some(&2));
}

#[test]
fn test_parsed_document_json_shape() {
    let json = r#"{
        "file": "lib/app.ex",
        "language": "elixir",
        "symbols": [
            {"type": "module", "name": "App", "line": 1},
            {"type": "function", "name": "start", "line": 2, "arity": 2, "visibility": "public"}
        ],
        "references": [{"type": "alias", "module": "App.Repo", "line": 3}],
        "calls": [{"name": "start_link", "module": "Supervisor", "arity": 2, "line": 4}]
    }"#;
    let doc: ParsedDocument = serde_json::from_str(json).unwrap();

    assert_eq!(doc.file, "lib/app.ex");
    assert_eq!(doc.parsed.symbols[1].arity, Some(2));
    assert_eq!(doc.parsed.references[0].kind, ReferenceKind::Alias);
    assert_eq!(doc.parsed.calls[0].module.as_deref(), Some("Supervisor"));
}

#[test]
fn test_dependency_shapes() {
    let json = r#"{
        "name": "web",
        "dependencies": ["core", {"name": "phoenix", "version": "~> 1.7"}]
    }"#;
    let manifest: RepoManifest = serde_json::from_str(json).unwrap();

    assert_eq!(manifest.dependencies[0], Dependency::Name("core".into()));
    assert_eq!(manifest.dependencies[1].name(), "phoenix");
    assert_eq!(manifest.dependencies[1].version(), Some("~> 1.7"));
    assert!(manifest.dev_dependencies.is_empty());
}

#[test]
fn test_load_documents_json_and_yaml() {
    let dir = tempfile::TempDir::new().unwrap();
    let json_path = dir.path().join("a.json");
    let yaml_path = dir.path().join("b.yaml");
    std::fs::write(
        &json_path,
        r#"{"file": "a.ex", "language": "elixir",
            "symbols": [{"type": "module", "name": "A", "line": 1},
                        {"type": "function", "name": "run", "line": 2, "arity": 0}],
            "calls": [{"name": "work", "module": "B", "arity": 0, "line": 3}]}"#,
    )
    .unwrap();
    std::fs::write(
        &yaml_path,
        "file: b.ex\nlanguage: elixir\nsymbols:\n  - {type: module, name: B, line: 1}\n  - {type: function, name: work, line: 2, arity: 0}\n",
    )
    .unwrap();

    let docs = load_parsed_documents(&[json_path, yaml_path]).unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].file, "a.ex");
    assert_eq!(docs[1].file, "b.ex");

    let outcome = index_documents(&docs);
    assert_eq!(outcome.calls, CallResolution { resolved: 1, unresolved: 0 });
    assert_eq!(outcome.graph.callees("A.run/0"), vec!["B.work/0"]);
    assert_eq!(outcome.reports.len(), 2);
}

#[test]
fn test_load_rejects_unknown_extension() {
    let err = load_parsed_document(&PathBuf::from("symbols.txt")).unwrap_err();
    assert!(err.to_string().contains("Unsupported input format"));
}

#[test]
fn test_load_portfolio_layouts() {
    let dir = tempfile::TempDir::new().unwrap();
    let list = dir.path().join("list.yaml");
    let wrapped = dir.path().join("wrapped.json");
    std::fs::write(&list, "- name: core\n- name: web\n  dependencies: [core]\n").unwrap();
    std::fs::write(
        &wrapped,
        r#"{"repos": [{"name": "core", "dev_dependencies": [{"name": "credo", "version": "1.0"}]}]}"#,
    )
    .unwrap();

    let repos = load_portfolio(&list).unwrap();
    assert_eq!(repos.len(), 2);
    assert_eq!(repos[1].dependencies, vec![Dependency::Name("core".into())]);

    let repos = load_portfolio(&wrapped).unwrap();
    assert_eq!(repos[0].dev_dependencies[0].version(), Some("1.0"));
}

#[test]
fn test_ingest_report_snapshot() {
    let mut builder = GraphBuilder::new();
    let report = builder.add_from_parsed("lib/accounts.ex", &accounts_file());
    insta::assert_json_snapshot!(report, @r#"
    {
      "file": "lib/accounts.ex",
      "modules": 2,
      "functions": 3,
      "classes": 1,
      "references": 3,
      "dropped_references": 0,
      "call_sites": 0,
      "dropped_call_sites": 0
    }
    "#);
}
