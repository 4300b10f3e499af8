//! Longest-chain search shared by call depth and dependency depth
//!
//! A node's depth is the number of hops on the longest chain from it to a
//! node with no successors. If the search re-enters a node that is already on
//! the current path, the node (and everything that can reach it) has no finite
//! depth and reports `Depth::CycleDetected`. Post-order on an explicit stack;
//! results are memoized so a full sweep over every node stays O(V + E).

use std::collections::{HashMap, HashSet};
use trellis_core::Depth;

struct Frame {
    node: String,
    children: Vec<String>,
    next: usize,
    best: usize,
    cyclic: bool,
}

impl Frame {
    fn new(node: String, children: Vec<String>) -> Self {
        Frame {
            node,
            children,
            next: 0,
            best: 0,
            cyclic: false,
        }
    }

    fn absorb(&mut self, child: Depth) {
        match child {
            Depth::Finite(d) => self.best = self.best.max(d + 1),
            Depth::CycleDetected => self.cyclic = true,
        }
    }
}

pub(crate) fn longest_chain<F>(
    start: &str,
    successors: F,
    memo: &mut HashMap<String, Depth>,
) -> Depth
where
    F: Fn(&str) -> Vec<String>,
{
    if let Some(depth) = memo.get(start) {
        return *depth;
    }

    let mut on_path: HashSet<String> = HashSet::from([start.to_string()]);
    let mut stack = vec![Frame::new(start.to_string(), successors(start))];

    while let Some(frame) = stack.last_mut() {
        if frame.next < frame.children.len() {
            let child = frame.children[frame.next].clone();
            frame.next += 1;

            if on_path.contains(&child) {
                frame.cyclic = true;
                continue;
            }
            if let Some(depth) = memo.get(&child) {
                frame.absorb(*depth);
                continue;
            }

            let children = successors(&child);
            on_path.insert(child.clone());
            stack.push(Frame::new(child, children));
        } else {
            let Some(done) = stack.pop() else { break };
            on_path.remove(&done.node);
            let depth = if done.cyclic {
                Depth::CycleDetected
            } else {
                Depth::Finite(done.best)
            };
            memo.insert(done.node, depth);
            if let Some(parent) = stack.last_mut() {
                parent.absorb(depth);
            }
        }
    }

    memo.get(start).copied().unwrap_or(Depth::Finite(0))
}
