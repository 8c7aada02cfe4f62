//! Engine configuration
//!
//! Settings can be built in code, read from the environment or loaded from a
//! TOML, YAML or JSON file. Missing keys fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default key of the stored form collection
pub const DEFAULT_STORAGE_KEY: &str = "dynamicFormBuilder_forms";

/// Configuration for the form builder engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key under which all schemas are stored
    pub storage_key: String,

    /// Directory for file-backed storage (in-memory when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// `tracing` filter directive, e.g. "warn" or "form_builder_core=debug"
    pub log_filter: String,

    /// Emit JSON log lines instead of plain text
    pub log_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: None,
            log_filter: "warn".to_string(),
            log_json: false,
        }
    }
}

impl EngineConfig {
    /// Create a new config builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage_key: std::env::var("FORM_BUILDER_STORAGE_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.storage_key),
            data_dir: std::env::var("FORM_BUILDER_DATA_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            log_filter: std::env::var("FORM_BUILDER_LOG").unwrap_or(defaults.log_filter),
            log_json: std::env::var("FORM_BUILDER_LOG_JSON")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
        }
    }

    /// Load config from a file, choosing the format by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => Ok(toml::from_str(&content)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
            "json" => Ok(serde_json::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    pub fn log_json(mut self, enabled: bool) -> Self {
        self.config.log_json = enabled;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
