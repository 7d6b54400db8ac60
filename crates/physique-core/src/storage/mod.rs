mod config;
mod plans;

pub use config::{Config, ReminderConfig, SessionConfig};
pub use plans::{PlanEntry, PlanStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/physique[-dev]/` based on PHYSIQUE_ENV.
///
/// Set PHYSIQUE_ENV=dev to use development data directory.
/// PHYSIQUE_CONFIG_DIR overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PHYSIQUE_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PHYSIQUE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("physique-dev")
            } else {
                base_dir.join("physique")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::NoDataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
