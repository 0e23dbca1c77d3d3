//! Database configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DbError;

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Path of the SQLite file
    pub database_path: PathBuf,
    /// How long SQLite waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
    /// SQLite journal mode (ignored for in-memory stores)
    pub journal_mode: String,
    /// Enforce foreign key constraints
    pub foreign_keys: bool,
    /// Keep a log of every executed statement
    pub record_statements: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/tablet.sqlite"),
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            foreign_keys: true,
            record_statements: false,
        }
    }
}

impl DbConfig {
    /// Reads a configuration from a JSON file. Missing keys take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, DbError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            DbError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }
}
