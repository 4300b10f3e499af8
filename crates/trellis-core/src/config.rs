//! Analysis configuration
//!
//! Read from `trellis.toml` in the working directory (or an explicit path).
//! Every key is optional:
//!
//! ```toml
//! [analysis]
//! max_depth = 10       # transitive caller/callee hop bound
//! path_max_depth = 10  # find_path / call_chain hop bound
//! max_cycles = 100     # cap on reported call cycles
//! hot_path_limit = 10  # number of hot functions reported
//! ```

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name.
pub const CONFIG_FILE: &str = "trellis.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_depth: usize,
    pub path_max_depth: usize,
    pub max_cycles: usize,
    pub hot_path_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            max_depth: 10,
            path_max_depth: 10,
            max_cycles: 100,
            hot_path_limit: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    analysis: AnalysisConfig,
}

impl AnalysisConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(file.analysis)
    }

    /// Load from a specific file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|e| GraphError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!("Loaded analysis config from {}", path.display());
        Ok(config)
    }

    /// Load `trellis.toml` from `root` if present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(GraphError::Config("max_depth must be at least 1".into()));
        }
        if self.path_max_depth == 0 {
            return Err(GraphError::Config("path_max_depth must be at least 1".into()));
        }
        Ok(())
    }
}
