//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global daemon settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Learning and prediction tuning
    #[serde(default)]
    pub learning: RawLearningConfig,

    /// Managed vehicles
    #[serde(default)]
    pub vehicles: Vec<RawVehicle>,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// Data directory for history files
    pub data_dir: Option<PathBuf>,

    /// Polling interval while no vehicle is charging (default: 300)
    pub idle_poll_seconds: Option<u64>,

    /// Polling interval while any vehicle is charging (default: 60)
    pub charging_poll_seconds: Option<u64>,
}

/// Learning settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLearningConfig {
    /// Sessions kept per (category, target) key (default: 50)
    pub max_sessions_per_key: Option<usize>,

    /// SoC change that forces a history save, in percentage points (default: 5.0)
    pub soc_save_delta: Option<f64>,

    /// Change in reported time remaining that forces a save, in minutes (default: 10.0)
    pub time_save_delta_minutes: Option<f64>,

    /// Finalized sessions needed before predicting (default: 2)
    pub min_sessions_for_prediction: Option<usize>,

    /// Nearest SoC samples used per curve (default: 3)
    pub neighbour_count: Option<usize>,

    /// Added to SoC distance before inverting it into a weight (default: 0.1)
    pub distance_offset: Option<f64>,
}

/// Raw vehicle definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawVehicle {
    /// Unique stable ID, also used in the history file name
    pub id: String,

    /// Display label
    pub label: Option<String>,

    /// JSON telemetry snapshot written by the host integration
    pub telemetry_path: Option<PathBuf>,

    pub battery_capacity_kwh: Option<f64>,
    pub charge_efficiency: Option<f64>,
    pub fast_charge_threshold: Option<f64>,
    pub slow_charge_factor: Option<f64>,
}
