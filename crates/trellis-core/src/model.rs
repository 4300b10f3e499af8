//! Core data structures for the knowledge graph

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Free-form key/value annotations carried by nodes and edges.
pub type Metadata = HashMap<String, String>;

/// Discriminates what kind of entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    // ── Structural ──────────────────────────────────────────
    File,
    Module,

    // ── Code entities (parser extracted) ────────────────────
    Function,
    Class,

    // ── Placeholders and portfolio ──────────────────────────
    /// Referenced but never defined in the ingested sources.
    External,
    Repo,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Module => "module",
            NodeKind::Function => "function",
            NodeKind::Class => "class",
            NodeKind::External => "external",
            NodeKind::Repo => "repo",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of relationship this edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    // ── Containment ─────────────────────────────────────────
    Defines,

    // ── Code relationships ──────────────────────────────────
    Calls,
    Imports,
    Uses,
    Alias,

    // ── Repository dependencies ─────────────────────────────
    DependsOn,
    DevDependsOn,
}

impl EdgeKind {
    /// Edge kinds that count as a module reference.
    pub const REFERENCES: [EdgeKind; 3] = [EdgeKind::Imports, EdgeKind::Uses, EdgeKind::Alias];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Defines => "defines",
            EdgeKind::Calls => "calls",
            EdgeKind::Imports => "imports",
            EdgeKind::Uses => "uses",
            EdgeKind::Alias => "alias",
            EdgeKind::DependsOn => "depends_on",
            EdgeKind::DevDependsOn => "dev_depends_on",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node in the graph. The id is chosen by the caller and never
/// generated internally (a file path, `Module.name/arity`, a repo name).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            kind,
            name: name.into(),
            metadata: Metadata::new(),
        }
    }

    /// Builder-style metadata insertion.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

/// A directed, typed edge. Endpoints are node ids and are not required to
/// exist when the edge is inserted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
            kind,
            metadata: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

/// Result of a longest-chain search. A chain that re-enters a node already
/// on the current path has no finite depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Finite(usize),
    CycleDetected,
}

impl Depth {
    pub fn finite(&self) -> Option<usize> {
        match self {
            Depth::Finite(d) => Some(*d),
            Depth::CycleDetected => None,
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, Depth::CycleDetected)
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Depth::Finite(d) => write!(f, "{}", d),
            Depth::CycleDetected => f.write_str("cycle"),
        }
    }
}
