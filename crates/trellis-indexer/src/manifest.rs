//! Repository dependency manifests

use serde::{Deserialize, Serialize};

/// A declared dependency: a bare name, or a name pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Name(String),
    Versioned { name: String, version: String },
}

impl Dependency {
    pub fn name(&self) -> &str {
        match self {
            Dependency::Name(name) => name,
            Dependency::Versioned { name, .. } => name,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Dependency::Name(_) => None,
            Dependency::Versioned { version, .. } => Some(version),
        }
    }
}

impl From<&str> for Dependency {
    fn from(name: &str) -> Self {
        Dependency::Name(name.to_string())
    }
}

/// One repository in a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoManifest {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub dev_dependencies: Vec<Dependency>,
}

impl RepoManifest {
    pub fn new(name: impl Into<String>) -> Self {
        RepoManifest {
            name: name.into(),
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
        }
    }

    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn depends_on_version(mut self, name: &str, version: &str) -> Self {
        self.dependencies.push(Dependency::Versioned {
            name: name.to_string(),
            version: version.to_string(),
        });
        self
    }

    pub fn dev_depends_on(mut self, name: &str) -> Self {
        self.dev_dependencies.push(name.into());
        self
    }
}

/// On-disk portfolio layout: either a bare list or `{ repos: [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Portfolio {
    List(Vec<RepoManifest>),
    Wrapped { repos: Vec<RepoManifest> },
}

impl Portfolio {
    pub(crate) fn into_repos(self) -> Vec<RepoManifest> {
        match self {
            Portfolio::List(repos) | Portfolio::Wrapped { repos } => repos,
        }
    }
}
