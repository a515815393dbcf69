mod config;
mod event_store;
pub mod migrations;

pub use config::{AnalyticsConfig, CoachConfig, Config, LoggingConfig};
pub use event_store::{EventStore, InsightCacheEntry};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `THRIVE_DATA_DIR` wins when set. Otherwise `~/.config/thrive`, or
/// `~/.config/thrive-dev` when `THRIVE_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("THRIVE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("THRIVE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("thrive-dev")
            } else {
                base_dir.join("thrive")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
