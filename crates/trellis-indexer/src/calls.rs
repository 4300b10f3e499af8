//! Call resolution pass
//!
//! Parsers report call expressions as `CallSite`s. `add_from_parsed`
//! attributes each one to the nearest preceding function in its file; this
//! pass runs once every file is in the graph and wires a Calls edge per site.
//!
//! Target lookup order:
//! 1. qualified call `M.f(..)` -> `M.f/arity`
//! 2. unqualified call -> the caller's own module `CallerModule.f/arity`
//! 3. unqualified call -> the only function anywhere with key `f/arity`
//!
//! Anything else becomes an `External` node (`M.f/arity` or `f/arity`) and
//! the edge is tagged `resolved = "false"`.

use crate::builder::{GraphBuilder, PendingCall, function_id};
use serde::{Deserialize, Serialize};
use trellis_core::{Edge, EdgeKind, Node, NodeKind, call_key};

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResolution {
    /// Edges whose target is a known function.
    pub resolved: usize,
    /// Edges pointing at an External placeholder.
    pub unresolved: usize,
}

impl CallResolution {
    pub fn total(&self) -> usize {
        self.resolved + self.unresolved
    }
}

impl GraphBuilder {
    /// Wire a Calls edge for every pending call site, then clear the queue.
    pub fn resolve_calls(&mut self) -> CallResolution {
        let pending = std::mem::take(&mut self.pending);
        let mut outcome = CallResolution::default();

        for call in &pending {
            let (target, resolved) = self.resolve_target(call);

            if !self.store.contains_node(&target) {
                let label = call.site.name.clone();
                self.store
                    .add_node(Node::new(&target, NodeKind::External, label));
            }

            self.store.add_edge(
                Edge::new(&call.caller, &target, EdgeKind::Calls)
                    .with_meta("file", &call.file)
                    .with_meta("line", call.site.line)
                    .with_meta("resolved", resolved),
            );

            if resolved {
                outcome.resolved += 1;
            } else {
                outcome.unresolved += 1;
            }
        }

        tracing::info!(
            "Resolved {} of {} call sites ({} external)",
            outcome.resolved,
            outcome.total(),
            outcome.unresolved
        );
        outcome
    }

    fn resolve_target(&self, call: &PendingCall) -> (String, bool) {
        let name = call.site.name.as_str();
        let arity = call.site.arity.unwrap_or(0);

        if let Some(module) = call.site.module.as_deref() {
            let id = function_id(Some(module), name, arity);
            let resolved = self.is_function(&id);
            return (id, resolved);
        }

        if let Some(module) = call.caller_module.as_deref() {
            let id = function_id(Some(module), name, arity);
            if self.is_function(&id) {
                return (id, true);
            }
        }

        if let Some(id) = self.symbols.lookup_unique(&call_key(name, arity)) {
            return (id, true);
        }

        let id = function_id(None, name, arity);
        let resolved = self.is_function(&id);
        (id, resolved)
    }

    fn is_function(&self, id: &str) -> bool {
        self.store.kind_of(id) == Some(NodeKind::Function)
    }
}
