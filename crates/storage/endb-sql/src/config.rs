//! Adapter configuration

use crate::error::{Result, StorageError};
use crate::observable::DEFAULT_EVENT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::dialect::Dialect;

/// Environment variable holding the dialect
pub const ENV_DIALECT: &str = "ENDB_SQL_DIALECT";
/// Environment variable holding the table name
pub const ENV_TABLE: &str = "ENDB_SQL_TABLE";
/// Environment variable holding the key size
pub const ENV_KEY_SIZE: &str = "ENDB_SQL_KEY_SIZE";

/// Immutable configuration of one adapter.
///
/// The connector is passed separately to [`crate::SqlAdapter::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// SQL dialect of the backend
    pub dialect: Dialect,

    /// Physical table name
    #[serde(default = "default_table")]
    pub table: String,

    /// Maximum key length in characters
    #[serde(default = "default_key_size")]
    pub key_size: usize,

    /// Buffer size of the lifecycle event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl AdapterConfig {
    /// Configuration with default table and key size
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            table: default_table(),
            key_size: default_key_size(),
            event_capacity: default_event_capacity(),
        }
    }

    /// Use a different table name
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Use a different maximum key length
    pub fn with_key_size(mut self, key_size: usize) -> Self {
        self.key_size = key_size;
        self
    }

    /// Check the configuration for values the adapter cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(StorageError::Config("Table name cannot be empty".to_string()));
        }
        if self.table.contains('\0') {
            return Err(StorageError::Config("Table name contains a NUL character".to_string()));
        }
        if self.key_size == 0 {
            return Err(StorageError::Config("Key size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| StorageError::Config(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| StorageError::Config(format!("Failed to parse JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, detecting the format from its extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::detect(path)?;
        let content = std::fs::read_to_string(path)?;
        match format {
            ConfigFormat::Toml => Self::from_toml_str(&content),
            ConfigFormat::Json => Self::from_json_str(&content),
        }
    }

    /// Build from `ENDB_SQL_*` environment variables.
    ///
    /// The dialect is required; table and key size fall back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let dialect = lookup(ENV_DIALECT)
            .ok_or_else(|| StorageError::Config(format!("{ENV_DIALECT} is not set")))?
            .parse::<Dialect>()?;
        let mut config = Self::new(dialect);
        if let Some(table) = lookup(ENV_TABLE) {
            config.table = table;
        }
        if let Some(size) = lookup(ENV_KEY_SIZE) {
            config.key_size = size
                .trim()
                .parse()
                .map_err(|e| StorageError::Config(format!("Invalid {ENV_KEY_SIZE}: {e}")))?;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn detect(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(StorageError::Config(format!(
                "Cannot detect config format of {}",
                path.display()
            ))),
        }
    }
}

fn default_table() -> String {
    "endb".to_string()
}

fn default_key_size() -> usize {
    255
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}
