//! Typed multigraph keyed by string ids, with incremental adjacency indices

use crate::error::{GraphError, Result};
use crate::model::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Aggregate counts over a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<NodeKind, usize>,
    pub edges_by_type: BTreeMap<EdgeKind, usize>,
}

/// The knowledge graph, a directed multigraph.
///
/// Edges live in one append-only vector; `outgoing` and `incoming` map a node
/// id to the positions of its edges so neighbor queries cost O(degree).
/// Duplicate edges are kept, and edges may name ids that were never added.
#[derive(Clone, Default)]
pub struct GraphStore {
    nodes: HashMap<String, Node>,
    edges: Vec<Edge>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("node_count", &self.nodes.len())
            .field("edge_count", &self.edges.len())
            .finish()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any node with the same id.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Append an edge. No endpoint validation.
    pub fn add_edge(&mut self, edge: Edge) {
        let idx = self.edges.len();
        self.outgoing.entry(edge.source.clone()).or_default().push(idx);
        self.incoming.entry(edge.target.clone()).or_default().push(idx);
        self.edges.push(edge);
    }

    /// Get a node by id.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Like [`GraphStore::get_node`], for callers that treat a miss as an error.
    pub fn require_node(&self, id: &str) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Kind of a node, if it exists.
    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.nodes.get(id).map(|n| n.kind)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges, duplicates included.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over all nodes (unordered).
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate over all edges in insertion order.
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// All nodes of one kind, sorted by id.
    pub fn nodes_by_type(&self, kind: NodeKind) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().filter(|n| n.kind == kind).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Ids of all nodes of one kind, sorted.
    pub fn ids_by_type(&self, kind: NodeKind) -> Vec<String> {
        self.nodes_by_type(kind).into_iter().map(|n| n.id.clone()).collect()
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn outgoing<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> + use<'a> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Incoming edges of a node, in insertion order.
    pub fn incoming<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> + use<'a> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Check if an edge of `kind` exists from `source` to `target`.
    pub fn has_edge_between(&self, source: &str, target: &str, kind: EdgeKind) -> bool {
        self.outgoing(source)
            .any(|e| e.target == target && e.kind == kind)
    }

    /// Drop every node, edge and index entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            ..GraphStats::default()
        };
        for node in self.all_nodes() {
            *stats.nodes_by_type.entry(node.kind).or_insert(0) += 1;
        }
        for edge in self.all_edges() {
            *stats.edges_by_type.entry(edge.kind).or_insert(0) += 1;
        }
        stats
    }
}
