//! Derived read operations over the graph
//!
//! Every query answers in terms of node ids. Neighbor lists are de-duplicated
//! and sorted so results never depend on edge insertion order.

use crate::graph::GraphStore;
use crate::model::{EdgeKind, NodeKind};
use std::collections::{BTreeSet, HashMap, VecDeque};

impl GraphStore {
    /// Targets of outgoing edges whose kind is in `kinds`.
    pub fn successors(&self, id: &str, kinds: &[EdgeKind]) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .outgoing(id)
            .filter(|e| kinds.contains(&e.kind))
            .map(|e| e.target.as_str())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Sources of incoming edges whose kind is in `kinds`.
    pub fn predecessors(&self, id: &str, kinds: &[EdgeKind]) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .incoming(id)
            .filter(|e| kinds.contains(&e.kind))
            .map(|e| e.source.as_str())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Functions (or externals) `function` calls directly.
    pub fn callees(&self, function: &str) -> Vec<String> {
        self.successors(function, &[EdgeKind::Calls])
    }

    /// Functions that call `function` directly.
    pub fn callers(&self, function: &str) -> Vec<String> {
        self.predecessors(function, &[EdgeKind::Calls])
    }

    /// Modules referenced from `module` through imports, uses or aliases.
    pub fn imports_of(&self, module: &str) -> Vec<String> {
        self.successors(module, &EdgeKind::REFERENCES)
    }

    /// Modules that reference `module` through imports, uses or aliases.
    pub fn imported_by(&self, module: &str) -> Vec<String> {
        self.predecessors(module, &EdgeKind::REFERENCES)
    }

    /// Functions defined by `module`.
    pub fn functions_of(&self, module: &str) -> Vec<String> {
        self.successors(module, &[EdgeKind::Defines])
            .into_iter()
            .filter(|id| self.kind_of(id) == Some(NodeKind::Function))
            .collect()
    }

    /// Every node adjacent to `id` in either direction, any edge kind.
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .outgoing(id)
            .map(|e| e.target.as_str())
            .chain(self.incoming(id).map(|e| e.source.as_str()))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Shortest path over edges of any kind. See [`GraphStore::find_path_via`].
    pub fn find_path(&self, from: &str, to: &str, max_depth: usize) -> Option<Vec<String>> {
        self.bfs_path(from, to, max_depth, None)
    }

    /// Shortest path from `from` to `to` following only `kinds` edges.
    ///
    /// Breadth-first; neighbors are expanded in sorted id order so equally
    /// short paths always resolve the same way. The path includes both
    /// endpoints and `[from]` is returned when `from == to`. `None` means the
    /// target was not reached within `max_depth` hops.
    pub fn find_path_via(
        &self,
        from: &str,
        to: &str,
        max_depth: usize,
        kinds: &[EdgeKind],
    ) -> Option<Vec<String>> {
        self.bfs_path(from, to, max_depth, Some(kinds))
    }

    fn bfs_path(
        &self,
        from: &str,
        to: &str,
        max_depth: usize,
        kinds: Option<&[EdgeKind]>,
    ) -> Option<Vec<String>> {
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut parent: HashMap<String, String> = HashMap::new();
        let mut queue = VecDeque::from([(from.to_string(), 0usize)]);
        parent.insert(from.to_string(), String::new());

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let next: BTreeSet<&str> = self
                .outgoing(&current)
                .filter(|e| kinds.is_none_or(|k| k.contains(&e.kind)))
                .map(|e| e.target.as_str())
                .collect();

            for neighbor in next {
                if parent.contains_key(neighbor) {
                    continue;
                }
                parent.insert(neighbor.to_string(), current.clone());
                if neighbor == to {
                    return Some(rebuild_path(&parent, from, to));
                }
                queue.push_back((neighbor.to_string(), depth + 1));
            }
        }

        None
    }
}

fn rebuild_path(parent: &HashMap<String, String>, from: &str, to: &str) -> Vec<String> {
    let mut path = vec![to.to_string()];
    let mut cursor = to;
    while cursor != from {
        match parent.get(cursor) {
            Some(prev) => {
                path.push(prev.clone());
                cursor = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
