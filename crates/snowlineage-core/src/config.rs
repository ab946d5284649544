//! Configuration schema (snowlineage.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::query::{MAX_DISTANCE, MIN_DISTANCE};

/// Analysis defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Default traversal distance when none is given on the command line
    #[serde(default = "default_max_distance")]
    pub max_distance: u32,
}

fn default_max_distance() -> u32 {
    MIN_DISTANCE
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_distance: default_max_distance(),
        }
    }
}

impl AnalysisConfig {
    /// Whether `max_distance` is inside the accepted range
    pub fn is_valid(&self) -> bool {
        (MIN_DISTANCE..=MAX_DISTANCE).contains(&self.max_distance)
    }
}

/// Warehouse connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Warehouse type (only snowflake today)
    #[serde(rename = "type")]
    pub warehouse_type: String,

    /// Connection settings (warehouse-specific)
    #[serde(flatten)]
    pub settings: HashMap<String, String>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            warehouse_type: "snowflake".to_string(),
            settings: HashMap::new(),
        }
    }
}

impl WarehouseConfig {
    /// Look up a setting, falling back to an environment variable
    ///
    /// Secrets are usually kept out of the config file and supplied through
    /// the environment (or a `.env` file loaded by the caller).
    pub fn setting_or_env(&self, key: &str, env_var: &str) -> Option<String> {
        self.settings
            .get(key)
            .cloned()
            .or_else(|| std::env::var(env_var).ok())
            .filter(|value| !value.trim().is_empty())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analysis defaults
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Warehouse connection configuration
    #[serde(default)]
    pub warehouse: Option<WarehouseConfig>,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
