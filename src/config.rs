//! Configuration file parsing
//!
//! Reads pg-typegen.toml configuration files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// One entry per generated store: a database to compile against, a
    /// query directory, and an output directory.
    #[serde(default)]
    pub stores: Vec<StoreConfig>,

    /// Postgres `typname` → fully qualified Rust type path. Entries extend
    /// and override the printer's built-in type table, and suppress enum
    /// model generation for the named type.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Connection string of the database whose schema types the queries.
    pub database: String,

    /// Directory containing the `*.sql` query files.
    pub queries: PathBuf,

    /// Directory receiving the generated `database.rs`, `models.rs`,
    /// `queries.rs`.
    pub output: PathBuf,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.stores.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[stores]] section is required".to_string(),
            ));
        }

        for (idx, store) in self.stores.iter().enumerate() {
            if store.database.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "stores[{idx}]: 'database' must not be empty"
                )));
            }
        }

        Ok(())
    }
}
