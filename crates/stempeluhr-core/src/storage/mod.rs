mod config;
mod database;
mod repository;

pub use config::{Config, Settings, SettingsStore};
pub use database::Database;
pub use repository::TrackingRepository;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `STEMPELUHR_DATA_DIR` overrides the location wholesale. Otherwise this
/// is `~/.config/stempeluhr[-dev]/` based on STEMPELUHR_ENV; set
/// STEMPELUHR_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var("STEMPELUHR_DATA_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("STEMPELUHR_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("stempeluhr-dev")
            } else {
                base_dir.join("stempeluhr")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
