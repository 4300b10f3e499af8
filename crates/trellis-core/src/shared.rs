//! Serialized access point for one graph instance
//!
//! A `SharedGraph` is the only way to reach its `GraphStore`: callers hand in a
//! closure and never hold a reference past it, so no caller observes a
//! half-applied update. Clones share the instance; separate instances share
//! nothing and can be driven from different threads at once.

use crate::graph::{GraphStats, GraphStore};
use crate::model::{Edge, Node};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<GraphStore>>,
}

impl SharedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an already-built store.
    pub fn from_store(store: GraphStore) -> Self {
        SharedGraph {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Run a read-only request against the graph.
    pub fn read<R>(&self, f: impl FnOnce(&GraphStore) -> R) -> R {
        // Every mutation is a single insert, so a poisoned lock still guards
        // a consistent store.
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&*guard)
    }

    /// Run a mutating request against the graph.
    pub fn write<R>(&self, f: impl FnOnce(&mut GraphStore) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut *guard)
    }

    pub fn add_node(&self, node: Node) {
        self.write(|g| g.add_node(node))
    }

    pub fn add_edge(&self, edge: Edge) {
        self.write(|g| g.add_edge(edge))
    }

    /// Cloned node record, so nothing borrowed escapes the lock.
    pub fn get_node(&self, id: &str) -> Option<Node> {
        self.read(|g| g.get_node(id).cloned())
    }

    pub fn stats(&self) -> GraphStats {
        self.read(|g| g.stats())
    }

    pub fn clear(&self) {
        self.write(|g| g.clear())
    }
}
