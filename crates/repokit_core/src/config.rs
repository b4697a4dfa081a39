//! Configuration inputs for store bootstrap and logging.
//!
//! # Responsibility
//! - Describe how a store connection is opened.
//! - Describe where and how verbosely core logs are written.
//!
//! # Invariants
//! - Every field has a default so partial documents deserialize.
//! - A store config without `path` opens an in-memory database.

use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Store connection settings consumed by `db::open_store`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file; `None` means in-memory.
    pub path: Option<PathBuf>,
    /// How long SQLite waits on a locked database before `SQLITE_BUSY`.
    pub busy_timeout_ms: u64,
    /// Whether `PRAGMA foreign_keys` is switched on.
    pub foreign_keys: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// Rolling file log settings consumed by `logging::init_logging`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`, case-insensitive.
    pub level: String,
    /// Absolute directory receiving rolling log files.
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: std::env::temp_dir().join("repokit-logs"),
        }
    }
}
