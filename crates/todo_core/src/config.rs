//! Store configuration.
//!
//! # Invariants
//! - `db_name` is a bare file stem: non-empty, no path separators.
//! - File-backed stores live at `<dir>/<db_name>.sqlite3`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Default database identity.
pub const DEFAULT_DB_NAME: &str = "TaskDB";
const DB_FILE_EXTENSION: &str = "sqlite3";

/// Engine selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreBackend {
    /// Ephemeral ordered-map engine.
    #[default]
    Memory,
    /// Durable SQLite engine rooted at `dir`.
    File { dir: PathBuf },
}

/// Connector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default)]
    pub backend: StoreBackend,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            db_name: default_db_name(),
            backend: StoreBackend::Memory,
        }
    }

    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self {
            db_name: default_db_name(),
            backend: StoreBackend::File { dir: dir.into() },
        }
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.db_name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyDbName);
        }
        if name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidDbName(self.db_name.clone()));
        }
        if let StoreBackend::File { dir } = &self.backend {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::EmptyDataDir);
            }
        }
        Ok(())
    }

    /// Database file location for the file backend.
    pub fn db_path(&self) -> Option<PathBuf> {
        match &self.backend {
            StoreBackend::Memory => None,
            StoreBackend::File { dir } => Some(dir.join(format!(
                "{}.{DB_FILE_EXTENSION}",
                self.db_name.trim()
            ))),
        }
    }
}

fn default_db_name() -> String {
    DEFAULT_DB_NAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    EmptyDbName,
    InvalidDbName(String),
    EmptyDataDir,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid store config: {message}"),
            Self::EmptyDbName => write!(f, "db_name cannot be empty"),
            Self::InvalidDbName(name) => {
                write!(f, "db_name must not contain path separators, got `{name}`")
            }
            Self::EmptyDataDir => write!(f, "file backend requires a non-empty dir"),
        }
    }
}

impl Error for ConfigError {}
