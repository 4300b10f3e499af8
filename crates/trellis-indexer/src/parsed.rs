//! Parser output consumed by the graph builder
//!
//! Per-language parsers live outside this crate. They emit one `ParsedFile`
//! per source file: ordered symbols, module references, and the call sites
//! found inside function bodies.

use serde::{Deserialize, Serialize};
use trellis_core::EdgeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Module,
    Function,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// A definition found by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub name: String,
    pub line: u32,
    #[serde(default)]
    pub arity: Option<usize>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Symbol {
    pub fn module(name: impl Into<String>, line: u32) -> Self {
        Symbol {
            kind: SymbolKind::Module,
            name: name.into(),
            line,
            arity: None,
            visibility: Visibility::Public,
        }
    }

    pub fn function(name: impl Into<String>, line: u32, arity: usize) -> Self {
        Symbol {
            kind: SymbolKind::Function,
            name: name.into(),
            line,
            arity: Some(arity),
            visibility: Visibility::Public,
        }
    }

    pub fn class(name: impl Into<String>, line: u32) -> Self {
        Symbol {
            kind: SymbolKind::Class,
            name: name.into(),
            line,
            arity: None,
            visibility: Visibility::Public,
        }
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Import,
    Use,
    Alias,
}

impl From<ReferenceKind> for EdgeKind {
    fn from(kind: ReferenceKind) -> Self {
        match kind {
            ReferenceKind::Import => EdgeKind::Imports,
            ReferenceKind::Use => EdgeKind::Uses,
            ReferenceKind::Alias => EdgeKind::Alias,
        }
    }
}

/// A module-level reference to another module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub module: String,
    pub line: u32,
}

impl Reference {
    pub fn new(kind: ReferenceKind, module: impl Into<String>, line: u32) -> Self {
        Reference {
            kind,
            module: module.into(),
            line,
        }
    }

    pub fn import(module: impl Into<String>, line: u32) -> Self {
        Self::new(ReferenceKind::Import, module, line)
    }
}

/// A call expression inside a function body. `module` is set when the call
/// is written fully qualified (`Repo.get(id)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub name: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub arity: Option<usize>,
    pub line: u32,
}

impl CallSite {
    /// Unqualified call.
    pub fn local(name: impl Into<String>, arity: usize, line: u32) -> Self {
        CallSite {
            name: name.into(),
            module: None,
            arity: Some(arity),
            line,
        }
    }

    /// Module-qualified call.
    pub fn remote(
        module: impl Into<String>,
        name: impl Into<String>,
        arity: usize,
        line: u32,
    ) -> Self {
        CallSite {
            name: name.into(),
            module: Some(module.into()),
            arity: Some(arity),
            line,
        }
    }
}

/// Everything a parser extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub language: String,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub calls: Vec<CallSite>,
}

impl ParsedFile {
    pub fn new(language: impl Into<String>) -> Self {
        ParsedFile {
            language: language.into(),
            ..Self::default()
        }
    }

    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    pub fn reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn call(mut self, call: CallSite) -> Self {
        self.calls.push(call);
        self
    }
}

/// A `ParsedFile` paired with the file identifier it came from, as stored
/// on disk by the parsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub file: String,
    #[serde(flatten)]
    pub parsed: ParsedFile,
}
