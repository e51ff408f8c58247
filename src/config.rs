//! Application configuration
//!
//! A small JSON-backed config constructed once at process start and passed
//! into [`crate::storage::Database`] and [`crate::service::LibraryService`].
//! There are no global singletons; everything flows through this value.

use crate::error::{LibraryError, Result};
use crate::storage::Database;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    30
}

/// Runtime configuration for the library core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Timeout applied to every mutating service operation, in seconds
    #[serde(default = "default_timeout_secs")]
    pub operation_timeout_secs: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database_path: Database::default_path(),
            operation_timeout_secs: default_timeout_secs(),
        }
    }
}

impl LibraryConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LibraryError::Configuration(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: LibraryConfig = serde_json::from_str(&data)?;

        if config.operation_timeout_secs == 0 {
            return Err(LibraryError::Configuration(
                "operation_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), data)?;
        Ok(())
    }

    /// Operation timeout as a [`Duration`]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}
