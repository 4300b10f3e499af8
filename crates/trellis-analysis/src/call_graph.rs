//! Call graph analysis over Calls edges
//!
//! Works on a borrowed `GraphStore`; nothing here mutates the graph. All
//! traversals use explicit work-lists and a visited set, so cyclic call
//! graphs terminate and deep ones cannot overflow the stack.

use crate::depth::longest_chain;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use trellis_core::{Depth, EdgeKind, GraphStore, NodeKind};

/// A function ranked by how connected it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotFunction {
    pub function: String,
    pub callers: usize,
    pub callees: usize,
    pub score: usize,
}

/// Call statistics for the functions a module defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleCallStats {
    pub module: String,
    pub function_count: usize,
    /// Calls edges with both endpoints in the module.
    pub internal_calls: usize,
    /// Distinct callees outside the module.
    pub external_dependencies: usize,
    pub external_callees: Vec<String>,
    /// `internal_calls / function_count`, 0.0 for a module with no functions.
    pub cohesion: f64,
}

#[derive(Clone, Copy)]
enum Direction {
    Callees,
    Callers,
}

pub struct CallGraphAnalyzer<'g> {
    graph: &'g GraphStore,
}

impl<'g> CallGraphAnalyzer<'g> {
    pub fn new(graph: &'g GraphStore) -> Self {
        CallGraphAnalyzer { graph }
    }

    fn functions(&self) -> Vec<String> {
        self.graph.ids_by_type(NodeKind::Function)
    }

    fn step(&self, id: &str, direction: Direction) -> Vec<String> {
        match direction {
            Direction::Callees => self.graph.callees(id),
            Direction::Callers => self.graph.callers(id),
        }
    }

    /// Breadth-first closure, at most `max_depth` hops from `start`.
    fn closure(&self, start: &str, max_depth: usize, direction: Direction) -> Vec<String> {
        let mut visited: HashSet<String> = HashSet::from([start.to_string()]);
        let mut reached: BTreeSet<String> = BTreeSet::new();
        let mut queue = VecDeque::from([(start.to_string(), 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for next in self.step(&current, direction) {
                if visited.insert(next.clone()) {
                    reached.insert(next.clone());
                    queue.push_back((next, depth + 1));
                }
            }
        }

        reached.into_iter().collect()
    }

    /// Everything `function` reaches through calls within `max_depth` hops.
    /// Never contains `function` itself, even when it is recursive.
    pub fn transitive_callees(&self, function: &str, max_depth: usize) -> Vec<String> {
        self.closure(function, max_depth, Direction::Callees)
    }

    /// Everything that reaches `function` through calls within `max_depth` hops.
    pub fn transitive_callers(&self, function: &str, max_depth: usize) -> Vec<String> {
        self.closure(function, max_depth, Direction::Callers)
    }

    /// Call cycles, at most `max_cycles` of them.
    ///
    /// From each function a depth-first walk follows callees, visiting every
    /// node once; reaching the start again records the current path. The walk
    /// keeps one shared path and never leaves the start's strongly connected
    /// component, since no cycle through the start can. A cycle is listed once
    /// no matter which member it was found from, and each consecutive pair
    /// (plus last -> first) is a Calls edge.
    pub fn find_cycles(&self, max_cycles: usize) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        if max_cycles == 0 {
            return cycles;
        }

        let calls = CallIndex::build(self.graph);
        let callees = calls.sorted_callees();
        let mut component = vec![0usize; calls.graph.node_count()];
        for (id, members) in tarjan_scc(&calls.graph).iter().enumerate() {
            for member in members {
                component[member.index()] = id;
            }
        }

        let mut seen: HashSet<Vec<String>> = HashSet::new();
        for function in self.functions() {
            let Some(&start) = calls.index.get(function.as_str()) else {
                continue;
            };
            let home = component[start.index()];
            let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
            // Current path, each step paired with the next callee to try.
            let mut path: Vec<(NodeIndex, usize)> = vec![(start, 0)];

            while let Some((node, next)) = path.last_mut() {
                let Some(&callee) = callees[node.index()].get(*next) else {
                    path.pop();
                    continue;
                };
                *next += 1;

                if callee == start {
                    let cycle: Vec<String> = path
                        .iter()
                        .map(|&(step, _)| calls.graph[step].to_string())
                        .collect();
                    let mut key = cycle.clone();
                    key.sort();
                    if seen.insert(key) {
                        cycles.push(cycle);
                        if cycles.len() >= max_cycles {
                            return cycles;
                        }
                    }
                } else if component[callee.index()] == home && visited.insert(callee) {
                    path.push((callee, 0));
                }
            }
        }

        cycles
    }

    /// Functions nothing calls.
    pub fn entry_points(&self) -> Vec<String> {
        self.functions()
            .into_iter()
            .filter(|f| self.graph.callers(f).is_empty())
            .collect()
    }

    /// Functions that call nothing.
    pub fn leaf_functions(&self) -> Vec<String> {
        self.functions()
            .into_iter()
            .filter(|f| self.graph.callees(f).is_empty())
            .collect()
    }

    /// Longest call chain from `function` down to a leaf; 0 for a leaf.
    pub fn call_depth(&self, function: &str) -> Depth {
        let mut memo = HashMap::new();
        longest_chain(function, |id| self.graph.callees(id), &mut memo)
    }

    /// `call_depth` of every function, sharing work between them.
    pub fn all_call_depths(&self) -> BTreeMap<String, Depth> {
        let mut memo = HashMap::new();
        self.functions()
            .into_iter()
            .map(|f| {
                let depth = longest_chain(&f, |id| self.graph.callees(id), &mut memo);
                (f, depth)
            })
            .collect()
    }

    /// Top `limit` functions by callers + callees, highest first.
    pub fn hot_paths(&self, limit: usize) -> Vec<HotFunction> {
        let mut ranked: Vec<HotFunction> = self
            .functions()
            .into_iter()
            .map(|f| {
                let callers = self.graph.callers(&f).len();
                let callees = self.graph.callees(&f).len();
                HotFunction {
                    function: f,
                    callers,
                    callees,
                    score: callers + callees,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.function.cmp(&b.function))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Shortest call chain from `from` to `to`, following Calls edges only.
    pub fn call_chain(&self, from: &str, to: &str, max_depth: usize) -> Option<Vec<String>> {
        self.graph.find_path_via(from, to, max_depth, &[EdgeKind::Calls])
    }

    pub fn module_call_stats(&self, module: &str) -> ModuleCallStats {
        let functions: HashSet<String> = self.graph.functions_of(module).into_iter().collect();
        let mut internal_calls = 0;
        let mut external: BTreeSet<String> = BTreeSet::new();

        for function in &functions {
            for edge in self
                .graph
                .outgoing(function)
                .filter(|e| e.kind == EdgeKind::Calls)
            {
                if functions.contains(&edge.target) {
                    internal_calls += 1;
                } else {
                    external.insert(edge.target.clone());
                }
            }
        }

        let function_count = functions.len();
        let cohesion = if function_count == 0 {
            0.0
        } else {
            internal_calls as f64 / function_count as f64
        };

        ModuleCallStats {
            module: module.to_string(),
            function_count,
            internal_calls,
            external_dependencies: external.len(),
            external_callees: external.into_iter().collect(),
            cohesion,
        }
    }

    /// Groups of two or more nodes that can all reach each other through
    /// calls. Members are sorted, groups are sorted by their first member.
    ///
    /// Tarjan's algorithm over the Calls subgraph, O(V + E).
    pub fn strongly_connected_components(&self) -> Vec<Vec<String>> {
        let calls = CallIndex::build(self.graph);
        let mut components: Vec<Vec<String>> = tarjan_scc(&calls.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut members: Vec<String> = component
                    .iter()
                    .map(|&idx| calls.graph[idx].to_string())
                    .collect();
                members.sort();
                members
            })
            .collect();
        components.sort();
        components
    }
}

/// The Calls subgraph with dense indices, for the whole-graph algorithms.
struct CallIndex<'g> {
    graph: DiGraph<&'g str, ()>,
    index: HashMap<&'g str, NodeIndex>,
}

impl<'g> CallIndex<'g> {
    fn build(store: &'g GraphStore) -> Self {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();

        for edge in store.all_edges().filter(|e| e.kind == EdgeKind::Calls) {
            let source = *index
                .entry(edge.source.as_str())
                .or_insert_with(|| graph.add_node(edge.source.as_str()));
            let target = *index
                .entry(edge.target.as_str())
                .or_insert_with(|| graph.add_node(edge.target.as_str()));
            graph.add_edge(source, target, ());
        }

        CallIndex { graph, index }
    }

    /// Callees of every node by index, deduplicated and sorted by id.
    fn sorted_callees(&self) -> Vec<Vec<NodeIndex>> {
        self.graph
            .node_indices()
            .map(|node| {
                let mut callees: Vec<NodeIndex> = self.graph.neighbors(node).collect();
                callees.sort_by_key(|&callee| self.graph[callee]);
                callees.dedup();
                callees
            })
            .collect()
    }
}
