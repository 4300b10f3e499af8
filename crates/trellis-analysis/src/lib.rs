//! Call-graph and cross-repository analysis

pub mod call_graph;
pub mod cross_repo;
pub(crate) mod depth;


pub use call_graph::{CallGraphAnalyzer, HotFunction, ModuleCallStats};
pub use cross_repo::{
    AffectedRepo, CrossRepoAnalyzer, DependencyEdge, ImpactReport, RepoNode, RiskLevel,
    SharedDependency, UpgradeOrder, VersionConflict, VersionUse, build_cross_repo_graph,
    major_version,
};
