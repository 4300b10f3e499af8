//! CLI command implementations

use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use trellis_analysis::{CallGraphAnalyzer, CrossRepoAnalyzer};
use trellis_core::{AnalysisConfig, EdgeKind};
use trellis_indexer::{IndexOutcome, index_documents, load_parsed_documents, load_portfolio};

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn index(files: &[PathBuf]) -> anyhow::Result<IndexOutcome> {
    tracing::info!("Indexing {} parsed files", files.len());
    let documents = load_parsed_documents(files)?;
    let outcome = index_documents(&documents);
    tracing::info!(
        "Indexed {} nodes, {} edges",
        outcome.graph.node_count(),
        outcome.graph.edge_count()
    );
    Ok(outcome)
}

pub fn graph(files: &[PathBuf]) -> anyhow::Result<()> {
    let outcome = index(files)?;
    print_json(&json!({
        "stats": outcome.graph.stats(),
        "files": outcome.reports,
        "calls": outcome.calls,
    }))
}

pub fn calls(
    files: &[PathBuf],
    function: Option<&str>,
    module: Option<&str>,
    config: &AnalysisConfig,
) -> anyhow::Result<()> {
    let outcome = index(files)?;
    let analyzer = CallGraphAnalyzer::new(&outcome.graph);

    let mut report = match function {
        Some(function) => {
            outcome.graph.require_node(function)?;
            json!({
                "function": function,
                "callers": outcome.graph.callers(function),
                "callees": outcome.graph.callees(function),
                "transitive_callers": analyzer.transitive_callers(function, config.max_depth),
                "transitive_callees": analyzer.transitive_callees(function, config.max_depth),
                "depth": analyzer.call_depth(function),
            })
        }
        None => json!({
            "entry_points": analyzer.entry_points(),
            "leaf_functions": analyzer.leaf_functions(),
            "hot_paths": analyzer.hot_paths(config.hot_path_limit),
            "cycles": analyzer.find_cycles(config.max_cycles),
            "strongly_connected_components": analyzer.strongly_connected_components(),
            "depths": analyzer.all_call_depths(),
        }),
    };

    if let Some(module) = module {
        report["module"] = json!(analyzer.module_call_stats(module));
    }
    print_json(&report)
}

pub fn path(
    files: &[PathBuf],
    from: &str,
    to: &str,
    calls_only: bool,
    config: &AnalysisConfig,
) -> anyhow::Result<()> {
    let outcome = index(files)?;
    outcome.graph.require_node(from)?;
    outcome.graph.require_node(to)?;
    let path = if calls_only {
        outcome
            .graph
            .find_path_via(from, to, config.path_max_depth, &[EdgeKind::Calls])
    } else {
        outcome.graph.find_path(from, to, config.path_max_depth)
    };

    if path.is_none() {
        tracing::info!(
            "No path from {} to {} within {} hops",
            from,
            to,
            config.path_max_depth
        );
    }
    print_json(&json!({ "from": from, "to": to, "path": path }))
}

pub fn repos(portfolio: &Path, impact: Option<&str>) -> anyhow::Result<()> {
    let manifests = load_portfolio(portfolio)?;
    let analyzer = CrossRepoAnalyzer::from_manifests(&manifests);

    let mut report = json!({
        "repositories": analyzer.repo_names(),
        "upgrade_order": analyzer.suggest_upgrade_order(),
        "cycles": analyzer.find_cycles(),
        "shared_dependencies": analyzer.find_shared_dependencies(),
        "version_conflicts": analyzer.find_version_conflicts(),
    });

    if let Some(target) = impact {
        let Some(result) = analyzer.impact_analysis(target) else {
            anyhow::bail!("Unknown repository or dependency: {}", target);
        };
        report["impact"] = json!(result);
        report["dependency_depth"] = json!(analyzer.dependency_depth(target));
    }
    print_json(&report)
}
