mod config;
pub mod database;
pub mod memory;

pub use config::{Config, LoggingConfig, NotificationsConfig, TimerConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

/// Returns `~/.config/covey-pomodoro[-dev]/` based on COVEY_POMODORO_ENV.
///
/// Set COVEY_POMODORO_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("COVEY_POMODORO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("covey-pomodoro-dev")
    } else {
        base_dir.join("covey-pomodoro")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
