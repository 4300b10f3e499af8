//! Trellis Core: knowledge graph data model, store and queries

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod query;
pub mod shared;
pub mod symbols;


#[cfg(test)]
pub mod test_utils;

pub use config::{AnalysisConfig, CONFIG_FILE};
pub use error::{GraphError, Result};
pub use graph::{GraphStats, GraphStore};
pub use model::{Depth, Edge, EdgeKind, Metadata, Node, NodeKind};
pub use shared::SharedGraph;
pub use symbols::{SymbolTable, call_key};
