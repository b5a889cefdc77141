//! Default paths for chargecurve components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/chargecurve/config.toml` or `~/.config/chargecurve/config.toml`
//! - Data: `$XDG_DATA_HOME/chargecurve` or `~/.local/share/chargecurve`

use std::path::{Path, PathBuf};

use crate::VehicleId;

/// Environment variable for overriding the data directory
pub const CHARGECURVE_DATA_DIR_ENV: &str = "CHARGECURVE_DATA_DIR";

/// Environment variable for overriding the config file path
pub const CHARGECURVE_CONFIG_ENV: &str = "CHARGECURVE_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "chargecurve";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$CHARGECURVE_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/chargecurve/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/chargecurve/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CHARGECURVE_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$CHARGECURVE_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/chargecurve` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/chargecurve` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(CHARGECURVE_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking CHARGECURVE_DATA_DIR env var.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Path of the charge history file for one vehicle inside `data_dir`
pub fn history_file_path(data_dir: &Path, vehicle_id: &VehicleId) -> PathBuf {
    data_dir.join(format!("charge_history_{}.json", vehicle_id))
}
