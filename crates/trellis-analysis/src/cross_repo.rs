//! Repository-level dependency analysis
//!
//! Builds its own graph from manifests: one node per repository, one per
//! external dependency name, and a DependsOn / DevDependsOn edge per declared
//! dependency. "Repo-level" operations (upgrade order, cycles, depth) follow
//! edges between two repository nodes of either kind; impact and dependents
//! follow runtime DependsOn edges only.

use crate::depth::longest_chain;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;
use trellis_core::{Depth, EdgeKind, NodeKind};
use trellis_indexer::RepoManifest;

static MAJOR_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("static pattern"));

/// Major version of a version requirement: the first run of digits.
///
/// Deliberately naive: `"^1.2"` -> 1, `"v2"` -> 2, `"~> 0.9"` -> 0 (even
/// though 0.x minors break compatibility), `"latest"` -> none.
pub fn major_version(version: &str) -> Option<u64> {
    MAJOR_VERSION
        .find(version)
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoNode {
    pub name: String,
    /// `Repo` or `External`.
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// `DependsOn` or `DevDependsOn`.
    pub kind: EdgeKind,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify the share of the portfolio affected by a change.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.5 {
            RiskLevel::Critical
        } else if ratio >= 0.3 {
            RiskLevel::High
        } else if ratio >= 0.1 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedRepo {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub repo: String,
    pub directly_affected: Vec<AffectedRepo>,
    pub transitively_affected: Vec<AffectedRepo>,
    pub total_affected: usize,
    pub total_repos: usize,
    pub impact_ratio: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDependency {
    pub name: String,
    pub count: usize,
    pub used_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionUse {
    pub repo: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConflict {
    pub dependency: String,
    pub versions: Vec<VersionUse>,
    pub major_versions: Vec<u64>,
}

/// Result of the topological upgrade sort. `blocked` lists repositories
/// that sit on or behind a dependency cycle and therefore never became ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOrder {
    pub order: Vec<String>,
    pub blocked: Vec<String>,
}

impl UpgradeOrder {
    pub fn is_complete(&self) -> bool {
        self.blocked.is_empty()
    }
}

pub struct CrossRepoAnalyzer {
    graph: DiGraph<RepoNode, DependencyEdge>,
    index: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for CrossRepoAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossRepoAnalyzer")
            .field("node_count", &self.graph.node_count())
            .field("edge_count", &self.graph.edge_count())
            .finish()
    }
}

/// Build the repository graph for a portfolio.
pub fn build_cross_repo_graph(repos: &[RepoManifest]) -> CrossRepoAnalyzer {
    CrossRepoAnalyzer::from_manifests(repos)
}

impl CrossRepoAnalyzer {
    pub fn from_manifests(repos: &[RepoManifest]) -> Self {
        let mut analyzer = CrossRepoAnalyzer {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };

        let mut declared = Vec::with_capacity(repos.len());
        for repo in repos {
            if analyzer.index.contains_key(&repo.name) {
                tracing::warn!(
                    "Duplicate repository {} in portfolio, keeping the first",
                    repo.name
                );
                continue;
            }
            let idx = analyzer.graph.add_node(RepoNode {
                name: repo.name.clone(),
                kind: NodeKind::Repo,
            });
            analyzer.index.insert(repo.name.clone(), idx);
            declared.push((idx, repo));
        }

        for (idx, repo) in declared {
            let runtime = repo.dependencies.iter().map(|d| (d, EdgeKind::DependsOn));
            let dev = repo.dev_dependencies.iter().map(|d| (d, EdgeKind::DevDependsOn));
            for (dependency, kind) in runtime.chain(dev) {
                let target = analyzer.node_for(dependency.name());
                analyzer.graph.add_edge(
                    idx,
                    target,
                    DependencyEdge {
                        kind,
                        version: dependency.version().map(str::to_string),
                    },
                );
            }
        }

        tracing::info!(
            "Built cross-repo graph: {} repositories, {} external dependencies, {} edges",
            analyzer.repo_names().len(),
            analyzer.graph.node_count() - analyzer.repo_names().len(),
            analyzer.graph.edge_count()
        );
        analyzer
    }

    /// Existing node for `name`, or a new External node.
    fn node_for(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(RepoNode {
            name: name.to_string(),
            kind: NodeKind::External,
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn is_repo(&self, idx: NodeIndex) -> bool {
        self.graph[idx].kind == NodeKind::Repo
    }

    fn repo_index(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied().filter(|&idx| self.is_repo(idx))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, name: &str) -> Option<&RepoNode> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    /// Repository names, sorted.
    pub fn repo_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .graph
            .node_indices()
            .filter(|&idx| self.is_repo(idx))
            .map(|idx| self.graph[idx].name.clone())
            .collect();
        names.sort();
        names
    }

    /// Everything `repo` declares, repositories and externals, sorted.
    pub fn dependencies_of(&self, repo: &str) -> Vec<String> {
        let Some(idx) = self.index.get(repo) else {
            return Vec::new();
        };
        let names: BTreeSet<String> = self
            .graph
            .edges_directed(*idx, Direction::Outgoing)
            .map(|e| self.graph[e.target()].name.clone())
            .collect();
        names.into_iter().collect()
    }

    /// Repositories `repo` depends on through either edge kind.
    fn repo_dependencies(&self, repo: &str) -> Vec<String> {
        let Some(idx) = self.index.get(repo) else {
            return Vec::new();
        };
        let names: BTreeSet<String> = self
            .graph
            .edges_directed(*idx, Direction::Outgoing)
            .filter(|e| self.is_repo(e.target()))
            .map(|e| self.graph[e.target()].name.clone())
            .collect();
        names.into_iter().collect()
    }

    /// Repositories with a runtime DependsOn edge to `name`.
    fn runtime_dependents(&self, name: &str) -> BTreeSet<String> {
        let Some(idx) = self.index.get(name) else {
            return BTreeSet::new();
        };
        self.graph
            .edges_directed(*idx, Direction::Incoming)
            .filter(|e| e.weight().kind == EdgeKind::DependsOn)
            .map(|e| self.graph[e.source()].name.clone())
            .collect()
    }

    /// Fixed point of "who depends on the current frontier", excluding `name`.
    fn transitive_dependents(&self, name: &str) -> BTreeSet<String> {
        let mut all = self.runtime_dependents(name);
        all.remove(name);
        let mut frontier = all.clone();

        while !frontier.is_empty() {
            let mut next = BTreeSet::new();
            for member in &frontier {
                for dependent in self.runtime_dependents(member) {
                    if dependent != name && !all.contains(&dependent) {
                        next.insert(dependent);
                    }
                }
            }
            all.extend(next.iter().cloned());
            frontier = next;
        }

        all
    }

    /// What a change to `repo` (or to an external dependency) would ripple
    /// into. `None` if the name is not in the graph.
    pub fn impact_analysis(&self, repo: &str) -> Option<ImpactReport> {
        self.index.get(repo)?;

        let mut direct = self.runtime_dependents(repo);
        direct.remove(repo);
        let all = self.transitive_dependents(repo);
        let transitive: Vec<AffectedRepo> = all
            .difference(&direct)
            .map(|name| AffectedRepo { name: name.clone() })
            .collect();

        let total_repos = self.repo_names().len();
        let impact_ratio = if total_repos == 0 {
            0.0
        } else {
            all.len() as f64 / total_repos as f64
        };

        Some(ImpactReport {
            repo: repo.to_string(),
            directly_affected: direct
                .into_iter()
                .map(|name| AffectedRepo { name })
                .collect(),
            transitively_affected: transitive,
            total_affected: all.len(),
            total_repos,
            impact_ratio,
            risk_level: RiskLevel::from_ratio(impact_ratio),
        })
    }

    /// Every repository that transitively depends on `repo` at runtime.
    pub fn get_all_dependents(&self, repo: &str) -> Vec<String> {
        self.transitive_dependents(repo).into_iter().collect()
    }

    /// Dependencies declared by two or more repositories, most used first.
    pub fn find_shared_dependencies(&self) -> Vec<SharedDependency> {
        let mut shared: Vec<SharedDependency> = self
            .graph
            .node_indices()
            .filter_map(|idx| {
                let used_by: BTreeSet<String> = self
                    .graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|e| self.graph[e.source()].name.clone())
                    .collect();
                (used_by.len() >= 2).then(|| SharedDependency {
                    name: self.graph[idx].name.clone(),
                    count: used_by.len(),
                    used_by: used_by.into_iter().collect(),
                })
            })
            .collect();

        shared.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        shared
    }

    /// Versioned declarations grouped by dependency name. Bare-name
    /// dependencies carry no version and are left out.
    pub fn find_dependency_versions(&self) -> BTreeMap<String, Vec<VersionUse>> {
        let mut versions: BTreeMap<String, Vec<VersionUse>> = BTreeMap::new();
        for edge in self.graph.edge_references() {
            let Some(version) = &edge.weight().version else {
                continue;
            };
            versions
                .entry(self.graph[edge.target()].name.clone())
                .or_default()
                .push(VersionUse {
                    repo: self.graph[edge.source()].name.clone(),
                    version: version.clone(),
                });
        }
        for uses in versions.values_mut() {
            uses.sort_by(|a, b| a.repo.cmp(&b.repo).then_with(|| a.version.cmp(&b.version)));
        }
        versions
    }

    /// Dependencies whose versioned declarations disagree on major version.
    pub fn find_version_conflicts(&self) -> Vec<VersionConflict> {
        self.find_dependency_versions()
            .into_iter()
            .filter_map(|(dependency, versions)| {
                let majors: BTreeSet<u64> = versions
                    .iter()
                    .filter_map(|v| major_version(&v.version))
                    .collect();
                (majors.len() > 1).then(|| VersionConflict {
                    dependency,
                    versions,
                    major_versions: majors.into_iter().collect(),
                })
            })
            .collect()
    }

    /// Order in which to upgrade repositories so each comes after every
    /// repository it depends on. Kahn's algorithm; among ready repositories
    /// the lexicographically smallest goes first.
    pub fn suggest_upgrade_order(&self) -> UpgradeOrder {
        let repos = self.repo_names();
        let mut pending: HashMap<String, usize> = HashMap::new();
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

        for repo in &repos {
            let deps = self.repo_dependencies(repo);
            pending.insert(repo.clone(), deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(repo.clone());
            }
        }

        let mut ready: BTreeSet<String> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| name.clone())
            .collect();
        let mut order = Vec::with_capacity(repos.len());

        while let Some(repo) = ready.pop_first() {
            for dependent in dependents.get(&repo).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent.clone());
                    }
                }
            }
            order.push(repo);
        }

        let placed: HashSet<&String> = order.iter().collect();
        let blocked: Vec<String> = repos
            .iter()
            .filter(|r| !placed.contains(r))
            .cloned()
            .collect();
        if !blocked.is_empty() {
            tracing::warn!("{} repositories are blocked by dependency cycles", blocked.len());
        }

        UpgradeOrder { order, blocked }
    }

    /// Dependency cycles between repositories. Each cycle is the path from
    /// the first repeated repository back to itself, inclusive, so it starts
    /// and ends on the same name. Each cycle is reported once.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut seen: HashSet<Vec<String>> = HashSet::new();

        for start in self.repo_names() {
            let mut visited: HashSet<String> = HashSet::from([start.clone()]);
            let mut on_path: HashSet<String> = HashSet::from([start.clone()]);
            let mut path = vec![start.clone()];
            let mut stack = vec![(self.repo_dependencies(&start), 0usize)];

            while let Some((children, next)) = stack.last_mut() {
                let Some(child) = children.get(*next).cloned() else {
                    stack.pop();
                    if let Some(done) = path.pop() {
                        on_path.remove(&done);
                    }
                    continue;
                };
                *next += 1;

                if on_path.contains(&child) {
                    let pos = path.iter().rposition(|p| *p == child).unwrap_or(0);
                    let mut cycle = path[pos..].to_vec();
                    let mut key = cycle.clone();
                    key.sort();
                    if seen.insert(key) {
                        cycle.push(child);
                        cycles.push(cycle);
                    }
                } else if visited.insert(child.clone()) {
                    let children = self.repo_dependencies(&child);
                    on_path.insert(child.clone());
                    path.push(child);
                    stack.push((children, 0));
                }
            }
        }

        cycles
    }

    /// Longest chain of repository dependencies below `repo`. `None` for a
    /// name that is not a repository.
    pub fn dependency_depth(&self, repo: &str) -> Option<Depth> {
        self.repo_index(repo)?;
        let mut memo = HashMap::new();
        Some(longest_chain(repo, |name| self.repo_dependencies(name), &mut memo))
    }
}
