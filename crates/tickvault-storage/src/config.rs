//! Database configuration.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tickvault_core::StorageTimeZone;

use crate::error::{StorageError, StorageResult};

/// Ordered store engine behind the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Durable redb file.
    #[default]
    Redb,
    /// Process-local `BTreeMap`s.
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Redb => f.write_str("redb"),
            BackendKind::Memory => f.write_str("memory"),
        }
    }
}

/// Database configuration.
///
/// ```toml
/// backend = "redb"
/// path = "./data/tickvault.redb"
/// timezone = "+08:00"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Store engine
    #[serde(default)]
    pub backend: BackendKind,

    /// Database file, used by the redb backend
    #[serde(default = "default_path")]
    pub path: String,

    /// Zone record timestamps are stored in (`UTC` or `+HH:MM`)
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_path() -> String {
    "./data/tickvault.redb".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_path(),
            timezone: default_timezone(),
        }
    }
}

impl DatabaseConfig {
    /// In-memory configuration, for tests and development.
    pub fn in_memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// The time zone is validated here so a bad value fails at load time.
    pub fn from_toml_str(content: &str) -> StorageResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.storage_time_zone()?;
        Ok(config)
    }

    /// The configured storage time zone.
    pub fn storage_time_zone(&self) -> StorageResult<StorageTimeZone> {
        self.timezone
            .parse()
            .map_err(|e| StorageError::Configuration(format!("timezone: {e}")))
    }
}
