//! Test utilities for Trellis core

use crate::graph::GraphStore;
use crate::model::{Edge, EdgeKind, Node, NodeKind};

/// Build a graph of Function nodes wired by Calls edges.
pub fn call_graph(edges: &[(&str, &str)]) -> GraphStore {
    let mut graph = GraphStore::new();
    for (caller, callee) in edges {
        for id in [caller, callee] {
            if !graph.contains_node(id) {
                graph.add_node(Node::new(*id, NodeKind::Function, *id));
            }
        }
        graph.add_edge(Edge::new(*caller, *callee, EdgeKind::Calls));
    }
    graph
}

/// Add a module that defines the given functions.
pub fn add_module(graph: &mut GraphStore, module: &str, functions: &[&str]) {
    graph.add_node(Node::new(module, NodeKind::Module, module));
    for function in functions {
        if !graph.contains_node(function) {
            graph.add_node(Node::new(*function, NodeKind::Function, *function));
        }
        graph.add_edge(Edge::new(module, *function, EdgeKind::Defines));
    }
}

/// Two modules with a single import edge between them.
pub fn import_pair() -> GraphStore {
    let mut graph = GraphStore::new();
    graph.add_node(Node::new("A", NodeKind::Module, "A"));
    graph.add_node(Node::new("B", NodeKind::Module, "B"));
    graph.add_edge(Edge::new("A", "B", EdgeKind::Imports));
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_graph_fixture() {
        let graph = call_graph(&[("a", "b"), ("b", "c")]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge_between("a", "b", EdgeKind::Calls));
    }
}
