//! Project configuration (`tabula.yaml`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the configuration file looked up by [`Config::discover`]
pub const FILE_NAME: &str = "tabula.yaml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub generator: GeneratorConfig,
}

/// Settings read by the record runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Rows fetched per page while streaming
    pub stream_page_size: usize,
    /// Upper bound for `find_set_buffered`; unlimited when absent
    pub max_buffered_rows: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stream_page_size: 256,
            max_buffered_rows: None,
        }
    }
}

impl RuntimeConfig {
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.stream_page_size = size;
        self
    }

    pub fn with_max_buffered_rows(mut self, limit: usize) -> Self {
        self.max_buffered_rows = Some(limit);
        self
    }
}

/// Settings read by `tabula generate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory holding `*.yaml` table schemas
    pub schema_dir: PathBuf,
    /// Directory receiving generated modules
    pub out_dir: PathBuf,
    /// Path of the runtime crate as seen from generated code
    pub runtime_crate: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from("schemas"),
            out_dir: PathBuf::from("src/tables"),
            runtime_crate: "tabula".to_string(),
        }
    }
}

impl Config {
    /// Parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        if config.runtime.stream_page_size == 0 {
            return Err(Error::Other(format!(
                "{}: runtime.stream_page_size must be at least 1",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Load `tabula.yaml` from `dir` if present, defaults otherwise
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(FILE_NAME);
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading configuration");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
