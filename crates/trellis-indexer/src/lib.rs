//! Ingestion of parser output and repository manifests

pub mod builder;
pub mod calls;
pub mod loader;
pub mod manifest;
pub mod parsed;

#[cfg(test)]
pub mod tests;

pub use builder::{GraphBuilder, IngestReport, function_id};
pub use calls::CallResolution;
pub use loader::{
    IndexOutcome, InputFormat, index_documents, load_parsed_document, load_parsed_documents,
    load_portfolio,
};
pub use manifest::{Dependency, RepoManifest};
pub use parsed::{
    CallSite, ParsedDocument, ParsedFile, Reference, ReferenceKind, Symbol, SymbolKind, Visibility,
};
