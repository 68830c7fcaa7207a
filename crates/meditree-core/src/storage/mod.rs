mod config;
pub mod database;

pub use config::{BreathingConfig, ClockConfig, Config, SessionDefaults};
pub use database::{Database, DatabaseSink, SessionRecord, Stats};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `$MEDITREE_HOME` wins when set. Otherwise `~/.config/meditree[-dev]/`
/// based on MEDITREE_ENV (set MEDITREE_ENV=dev for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("MEDITREE_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("MEDITREE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("meditree-dev")
            } else {
                base_dir.join("meditree")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
