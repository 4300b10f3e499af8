//! Integration tests for Trellis
//!
//! Parsed-file documents go through the loader, builder and call resolution
//! into a graph that the analyzers then query, both as a library and through
//! the CLI binary.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use trellis_analysis::{CallGraphAnalyzer, CrossRepoAnalyzer, RiskLevel};
use trellis_core::{AnalysisConfig, Depth, EdgeKind, NodeKind};
use trellis_indexer::{index_documents, load_parsed_documents, load_portfolio};

const WEB_JSON: &str = r#"{
  "file": "lib/web.ex",
  "language": "elixir",
  "symbols": [
    {"type": "module", "name": "Web", "line": 1},
    {"type": "function", "name": "handle", "line": 3, "arity": 1},
    {"type": "function", "name": "render", "line": 8, "arity": 1, "visibility": "private"}
  ],
  "references": [
    {"type": "import", "module": "Accounts", "line": 2}
  ],
  "calls": [
    {"name": "render", "arity": 1, "line": 4},
    {"name": "fetch", "module": "Accounts", "arity": 1, "line": 5},
    {"name": "info", "module": "Logger", "arity": 1, "line": 9}
  ]
}"#;

const ACCOUNTS_YAML: &str = "\
file: lib/accounts.ex
language: elixir
symbols:
  - {type: module, name: Accounts, line: 1}
  - {type: function, name: fetch, line: 3, arity: 1}
  - {type: function, name: validate, line: 7, arity: 1, visibility: private}
calls:
  - {name: validate, arity: 1, line: 4}
  - {name: get, module: Repo, arity: 2, line: 5}
";

const PORTFOLIO_YAML: &str = "\
repos:
  - name: core
    dependencies:
      - {name: jason, version: \"1.4\"}
  - name: accounts
    dependencies: [core]
  - name: web
    dependencies:
      - accounts
      - {name: jason, version: \"2.0\"}
    dev_dependencies: [core]
";

struct Fixture {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let web = dir.path().join("web.json");
        let accounts = dir.path().join("accounts.yaml");
        std::fs::write(&web, WEB_JSON).unwrap();
        std::fs::write(&accounts, ACCOUNTS_YAML).unwrap();
        Fixture {
            dir,
            files: vec![web, accounts],
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

fn run_cli(root: &Path, args: &[&str]) -> serde_json::Value {
    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to run trellis");

    assert!(
        output.status.success(),
        "trellis {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_index_and_resolve_calls() {
    let fixture = Fixture::new();
    let documents = load_parsed_documents(&fixture.files).unwrap();
    let outcome = index_documents(&documents);
    let graph = &outcome.graph;

    assert_eq!(outcome.calls.resolved, 3);
    assert_eq!(outcome.calls.unresolved, 2);

    assert_eq!(
        graph.callees("Web.handle/1"),
        vec!["Accounts.fetch/1", "Web.render/1"]
    );
    assert_eq!(
        graph.callees("Accounts.fetch/1"),
        vec!["Accounts.validate/1", "Repo.get/2"]
    );
    assert_eq!(graph.kind_of("Repo.get/2"), Some(NodeKind::External));
    assert_eq!(graph.kind_of("Logger.info/1"), Some(NodeKind::External));

    // The import placeholder was replaced once Accounts itself was indexed.
    assert_eq!(graph.kind_of("Accounts"), Some(NodeKind::Module));
    assert_eq!(graph.imports_of("Web"), vec!["Accounts"]);
    assert_eq!(graph.imported_by("Accounts"), vec!["Web"]);

    let stats = graph.stats();
    assert_eq!(stats.node_count, 10);
    assert_eq!(stats.nodes_by_type.get(&NodeKind::Function), Some(&4));
    assert_eq!(stats.nodes_by_type.get(&NodeKind::External), Some(&2));
    assert_eq!(stats.edges_by_type.get(&EdgeKind::Calls), Some(&5));
}

#[test]
fn test_analysis_over_indexed_graph() {
    let fixture = Fixture::new();
    let outcome = index_documents(&load_parsed_documents(&fixture.files).unwrap());
    let analyzer = CallGraphAnalyzer::new(&outcome.graph);

    assert_eq!(
        analyzer.transitive_callees("Web.handle/1", 10),
        vec![
            "Accounts.fetch/1",
            "Accounts.validate/1",
            "Logger.info/1",
            "Repo.get/2",
            "Web.render/1"
        ]
    );
    assert_eq!(analyzer.call_depth("Web.handle/1"), Depth::Finite(2));
    assert_eq!(analyzer.entry_points(), vec!["Web.handle/1"]);
    assert_eq!(analyzer.leaf_functions(), vec!["Accounts.validate/1"]);
    assert!(analyzer.find_cycles(100).is_empty());

    let stats = analyzer.module_call_stats("Accounts");
    assert_eq!(stats.function_count, 2);
    assert_eq!(stats.internal_calls, 1);
    assert_eq!(stats.external_callees, vec!["Repo.get/2"]);

    assert_eq!(
        outcome
            .graph
            .find_path("lib/web.ex", "Accounts.validate/1", 10),
        Some(vec![
            "lib/web.ex".to_string(),
            "Web".to_string(),
            "Accounts".to_string(),
            "Accounts.validate/1".to_string(),
        ])
    );
}

#[test]
fn test_portfolio_analysis() {
    let fixture = Fixture::new();
    let portfolio = fixture.write("portfolio.yaml", PORTFOLIO_YAML);
    let analyzer = CrossRepoAnalyzer::from_manifests(&load_portfolio(&portfolio).unwrap());

    let order = analyzer.suggest_upgrade_order();
    assert_eq!(order.order, vec!["core", "accounts", "web"]);
    assert!(order.blocked.is_empty());

    let impact = analyzer.impact_analysis("core").unwrap();
    assert_eq!(impact.directly_affected.len(), 1);
    assert_eq!(impact.transitively_affected[0].name, "web");
    assert_eq!(impact.risk_level, RiskLevel::Critical);

    let conflicts = analyzer.find_version_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].dependency, "jason");
    assert_eq!(conflicts[0].major_versions, vec![1, 2]);

    assert_eq!(analyzer.dependency_depth("web"), Some(Depth::Finite(2)));
    assert!(analyzer.find_cycles().is_empty());
}

#[test]
fn test_config_file_discovery() {
    let fixture = Fixture::new();
    fixture.write("trellis.toml", "[analysis]\nmax_depth = 1\n");

    let config = AnalysisConfig::discover(fixture.root()).unwrap();
    assert_eq!(config.max_depth, 1);
    assert_eq!(config.max_cycles, AnalysisConfig::default().max_cycles);
}

#[test]
fn test_cli_graph_stats() {
    let fixture = Fixture::new();
    let mut args = vec!["graph"];
    args.extend(fixture.files.iter().map(|p| p.to_str().unwrap()));

    let output = run_cli(fixture.root(), &args);
    assert_eq!(output["stats"]["node_count"], 10);
    assert_eq!(output["calls"]["resolved"], 3);
    assert_eq!(output["files"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_cli_calls_respects_config() {
    let fixture = Fixture::new();
    fixture.write("trellis.toml", "[analysis]\nmax_depth = 1\n");
    let mut args = vec!["calls", "--function", "Web.handle/1"];
    args.extend(fixture.files.iter().map(|p| p.to_str().unwrap()));

    let output = run_cli(fixture.root(), &args);
    assert_eq!(
        output["transitive_callees"],
        serde_json::json!(["Accounts.fetch/1", "Web.render/1"])
    );
    assert_eq!(output["depth"], serde_json::json!({"finite": 2}));
}

#[test]
fn test_cli_repos_with_impact() {
    let fixture = Fixture::new();
    let portfolio = fixture.write("portfolio.yaml", PORTFOLIO_YAML);

    let output = run_cli(
        fixture.root(),
        &["repos", portfolio.to_str().unwrap(), "--impact", "core"],
    );
    assert_eq!(
        output["upgrade_order"]["order"],
        serde_json::json!(["core", "accounts", "web"])
    );
    assert_eq!(output["impact"]["risk_level"], "critical");
    assert_eq!(output["dependency_depth"], serde_json::json!({"finite": 0}));
}

#[test]
fn test_cli_rejects_unknown_function() {
    let fixture = Fixture::new();
    let mut args = vec!["calls", "--function", "Nope.missing/0"];
    args.extend(fixture.files.iter().map(|p| p.to_str().unwrap()));

    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .arg("--root")
        .arg(fixture.root())
        .args(&args)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("node not found: Nope.missing/0"));
}
