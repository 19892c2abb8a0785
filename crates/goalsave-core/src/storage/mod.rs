//! Durable key-value persistence.
//!
//! The monitoring pipeline only ever talks to the [`KeyValueStore`] port;
//! [`Database`] backs it with SQLite and [`MemoryStore`] keeps it in process.

pub(crate) mod config;
pub mod database;
mod memory;
pub mod record;

pub use config::{
    Config, DeadlineConfig, LoggingConfig, SchedulerConfigSection, StoreConfig, MAX_INTERVAL_SECS,
    MAX_THROTTLE_HOURS,
};
pub use database::Database;
pub use memory::MemoryStore;
pub use record::{load_record, save_record, SCHEMA_VERSION};

use std::path::PathBuf;

use crate::error::StorageError;

/// Storage port: opaque string values under fixed keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns the data directory, creating it if needed.
///
/// `GOALSAVE_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/goalsave[-dev]/`, where GOALSAVE_ENV=dev selects the dev
/// directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("GOALSAVE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("GOALSAVE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("goalsave-dev")
            } else {
                base_dir.join("goalsave")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
