//! Ingests parser output into a `GraphStore`
//!
//! Scoping is by line number: a function, class or reference belongs to the
//! nearest preceding module symbol in the same file. Functions with no
//! enclosing module hang off the file node; references with no enclosing
//! module are dropped.

use crate::parsed::{CallSite, ParsedFile, SymbolKind};
use serde::{Deserialize, Serialize};
use trellis_core::{Edge, EdgeKind, GraphStore, Node, NodeKind, SymbolTable, call_key};

/// Counts for one ingested file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub file: String,
    pub modules: usize,
    pub functions: usize,
    pub classes: usize,
    pub references: usize,
    pub dropped_references: usize,
    pub call_sites: usize,
    pub dropped_call_sites: usize,
}

/// A call site attributed to its caller, waiting for every file to be
/// ingested before its target is resolved.
#[derive(Debug, Clone)]
pub(crate) struct PendingCall {
    pub file: String,
    pub caller: String,
    pub caller_module: Option<String>,
    pub site: CallSite,
}

/// Id of a function: `Module.name/arity`, or `name/arity` outside a module.
pub fn function_id(module: Option<&str>, name: &str, arity: usize) -> String {
    match module {
        Some(module) => format!("{}.{}", module, call_key(name, arity)),
        None => call_key(name, arity),
    }
}

/// The scope with the greatest line not after `line`. On equal lines the
/// later-declared scope wins.
fn enclosing<'a, T>(scopes: &'a [(u32, T)], line: u32) -> Option<&'a T> {
    let mut best: Option<&(u32, T)> = None;
    for scope in scopes {
        if scope.0 <= line && best.is_none_or(|b| scope.0 >= b.0) {
            best = Some(scope);
        }
    }
    best.map(|(_, value)| value)
}

/// Builds one analysis session's graph from any number of parsed files.
pub struct GraphBuilder {
    pub(crate) store: GraphStore,
    pub(crate) symbols: SymbolTable,
    pub(crate) pending: Vec<PendingCall>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder {
            store: GraphStore::new(),
            symbols: SymbolTable::new(),
            pending: Vec::new(),
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Call sites still waiting for [`GraphBuilder::resolve_calls`].
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    pub fn into_store(self) -> GraphStore {
        self.store
    }

    /// Add one parsed file. Never fails: input that cannot be placed in the
    /// graph is counted in the report and skipped.
    pub fn add_from_parsed(&mut self, file_id: &str, parsed: &ParsedFile) -> IngestReport {
        let mut report = IngestReport {
            file: file_id.to_string(),
            ..IngestReport::default()
        };

        let file_name = file_id.rsplit(['/', '\\']).next().unwrap_or(file_id);
        self.store.add_node(
            Node::new(file_id, NodeKind::File, file_name).with_meta("language", &parsed.language),
        );

        // Modules first, so later passes can scope against them.
        let mut modules: Vec<(u32, String)> = Vec::new();
        for symbol in parsed.symbols.iter().filter(|s| s.kind == SymbolKind::Module) {
            self.store.add_node(
                Node::new(&symbol.name, NodeKind::Module, &symbol.name)
                    .with_meta("file", file_id)
                    .with_meta("line", symbol.line),
            );
            self.store.add_edge(Edge::new(file_id, &symbol.name, EdgeKind::Defines));
            modules.push((symbol.line, symbol.name.clone()));
            report.modules += 1;
        }

        // (line, (function id, enclosing module)) for call attribution.
        let mut functions: Vec<(u32, (String, Option<String>))> = Vec::new();
        for symbol in parsed.symbols.iter().filter(|s| s.kind == SymbolKind::Function) {
            let module = enclosing(&modules, symbol.line).cloned();
            let arity = symbol.arity.unwrap_or(0);
            let id = function_id(module.as_deref(), &symbol.name, arity);

            let mut node = Node::new(&id, NodeKind::Function, &symbol.name)
                .with_meta("arity", arity)
                .with_meta("visibility", symbol.visibility.as_str())
                .with_meta("line", symbol.line)
                .with_meta("file", file_id);
            if let Some(module) = &module {
                node = node.with_meta("module", module);
            }
            self.store.add_node(node);

            let parent = module.as_deref().unwrap_or(file_id);
            self.store.add_edge(Edge::new(parent, &id, EdgeKind::Defines));
            self.symbols
                .insert(call_key(&symbol.name, arity), id.clone(), file_id.to_string());

            functions.push((symbol.line, (id, module)));
            report.functions += 1;
        }

        for symbol in parsed.symbols.iter().filter(|s| s.kind == SymbolKind::Class) {
            self.store.add_node(
                Node::new(&symbol.name, NodeKind::Class, &symbol.name)
                    .with_meta("file", file_id)
                    .with_meta("line", symbol.line),
            );
            self.store.add_edge(Edge::new(file_id, &symbol.name, EdgeKind::Defines));
            report.classes += 1;
        }

        for reference in &parsed.references {
            let Some(source) = enclosing(&modules, reference.line) else {
                tracing::debug!(
                    "Dropping {:?} of {} at {}:{} (no enclosing module)",
                    reference.kind,
                    reference.module,
                    file_id,
                    reference.line
                );
                report.dropped_references += 1;
                continue;
            };

            if !self.store.contains_node(&reference.module) {
                self.store.add_node(Node::new(
                    &reference.module,
                    NodeKind::External,
                    &reference.module,
                ));
            }
            self.store.add_edge(
                Edge::new(source, &reference.module, reference.kind.into())
                    .with_meta("line", reference.line),
            );
            report.references += 1;
        }

        for site in &parsed.calls {
            let Some((caller, caller_module)) = enclosing(&functions, site.line) else {
                tracing::debug!(
                    "Dropping call to {} at {}:{} (no enclosing function)",
                    site.name,
                    file_id,
                    site.line
                );
                report.dropped_call_sites += 1;
                continue;
            };
            self.pending.push(PendingCall {
                file: file_id.to_string(),
                caller: caller.clone(),
                caller_module: caller_module.clone(),
                site: site.clone(),
            });
            report.call_sites += 1;
        }

        tracing::debug!(
            "Ingested {}: {} modules, {} functions, {} classes, {} references",
            file_id,
            report.modules,
            report.functions,
            report.classes,
            report.references
        );
        report
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
