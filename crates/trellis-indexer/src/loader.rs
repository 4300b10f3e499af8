//! Reading parser output and portfolio manifests from disk

use crate::builder::{GraphBuilder, IngestReport};
use crate::calls::CallResolution;
use crate::manifest::{Portfolio, RepoManifest};
use crate::parsed::ParsedDocument;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use trellis_core::GraphStore;

/// Supported input encodings, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(InputFormat::Json),
            Some("yaml") | Some("yml") => Some(InputFormat::Yaml),
            _ => None,
        }
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let Some(format) = InputFormat::from_path(path) else {
        bail!("Unsupported input format: {}", path.display());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: T = match format {
        InputFormat::Json => serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        InputFormat::Yaml => serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };
    Ok(value)
}

/// Load one parsed-file document.
pub fn load_parsed_document(path: &Path) -> Result<ParsedDocument> {
    read_document(path)
}

/// Load many parsed-file documents, decoding them in parallel. Order of the
/// result matches `paths`.
pub fn load_parsed_documents(paths: &[PathBuf]) -> Result<Vec<ParsedDocument>> {
    paths
        .par_iter()
        .map(|path| load_parsed_document(path))
        .collect()
}

/// Load a portfolio of repository manifests.
pub fn load_portfolio(path: &Path) -> Result<Vec<RepoManifest>> {
    let portfolio: Portfolio = read_document(path)?;
    let repos = portfolio.into_repos();
    tracing::info!("Loaded {} repositories from {}", repos.len(), path.display());
    Ok(repos)
}

/// A fully built session graph plus what happened while building it.
#[derive(Debug)]
pub struct IndexOutcome {
    pub graph: GraphStore,
    pub reports: Vec<IngestReport>,
    pub calls: CallResolution,
}

/// Ingest every document, then resolve calls across all of them.
pub fn index_documents(documents: &[ParsedDocument]) -> IndexOutcome {
    let mut builder = GraphBuilder::new();
    let reports: Vec<IngestReport> = documents
        .iter()
        .map(|doc| builder.add_from_parsed(&doc.file, &doc.parsed))
        .collect();
    let calls = builder.resolve_calls();

    let dropped: usize = reports.iter().map(|r| r.dropped_references).sum();
    if dropped > 0 {
        tracing::info!("{} references had no enclosing module and were skipped", dropped);
    }

    IndexOutcome {
        graph: builder.into_store(),
        reports,
        calls,
    }
}
