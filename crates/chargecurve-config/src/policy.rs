//! Validated configuration structures

use crate::schema::{RawConfig, RawDaemonConfig, RawLearningConfig, RawVehicle};
use chargecurve_api::BatteryProfile;
use chargecurve_util::{VehicleId, default_data_dir};
use std::path::PathBuf;
use std::time::Duration;

/// Validated configuration ready for use by the learner and the daemon
#[derive(Debug, Clone)]
pub struct Config {
    /// Daemon configuration
    pub daemon: DaemonConfig,

    /// Learning and prediction tuning, shared by all vehicles
    pub learning: LearningPolicy,

    /// Managed vehicles
    pub vehicles: Vec<Vehicle>,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            daemon: DaemonConfig::from_raw(raw.daemon),
            learning: LearningPolicy::from_raw(raw.learning),
            vehicles: raw.vehicles.into_iter().map(Vehicle::from_raw).collect(),
        }
    }

    /// Get vehicle by ID
    pub fn get_vehicle(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| &v.id == id)
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,

    /// Polling interval while nothing is charging
    pub idle_poll: Duration,

    /// Polling interval while a vehicle is charging
    pub charging_poll: Duration,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: raw.data_dir.unwrap_or(defaults.data_dir),
            idle_poll: raw
                .idle_poll_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_poll),
            charging_poll: raw
                .charging_poll_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.charging_poll),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            idle_poll: Duration::from_secs(300),
            charging_poll: Duration::from_secs(60),
        }
    }
}

/// Tuning for session recording and prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningPolicy {
    /// Finalized sessions kept per session key
    pub max_sessions_per_key: usize,

    /// SoC change (percentage points) since the last save that triggers a save
    pub soc_save_delta: f64,

    /// Change in reported time remaining (minutes) since the last save that triggers a save
    pub time_save_delta_minutes: f64,

    /// Finalized sessions a key needs before it is used for prediction
    pub min_sessions_for_prediction: usize,

    /// Nearest SoC samples considered per historical curve
    pub neighbour_count: usize,

    /// Offset added to SoC distance before weighting, keeps exact matches finite
    pub distance_offset: f64,
}

impl Default for LearningPolicy {
    fn default() -> Self {
        Self {
            max_sessions_per_key: 50,
            soc_save_delta: 5.0,
            time_save_delta_minutes: 10.0,
            min_sessions_for_prediction: 2,
            neighbour_count: 3,
            distance_offset: 0.1,
        }
    }
}

impl LearningPolicy {
    fn from_raw(raw: RawLearningConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_sessions_per_key: raw
                .max_sessions_per_key
                .unwrap_or(defaults.max_sessions_per_key),
            soc_save_delta: raw.soc_save_delta.unwrap_or(defaults.soc_save_delta),
            time_save_delta_minutes: raw
                .time_save_delta_minutes
                .unwrap_or(defaults.time_save_delta_minutes),
            min_sessions_for_prediction: raw
                .min_sessions_for_prediction
                .unwrap_or(defaults.min_sessions_for_prediction),
            neighbour_count: raw.neighbour_count.unwrap_or(defaults.neighbour_count),
            distance_offset: raw.distance_offset.unwrap_or(defaults.distance_offset),
        }
    }
}

/// Validated vehicle definition
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub label: String,
    pub telemetry_path: Option<PathBuf>,
    pub profile: BatteryProfile,
}

impl Vehicle {
    fn from_raw(raw: RawVehicle) -> Self {
        let defaults = BatteryProfile::default();
        let profile = BatteryProfile {
            battery_capacity_kwh: raw
                .battery_capacity_kwh
                .unwrap_or(defaults.battery_capacity_kwh),
            charge_efficiency: raw.charge_efficiency.unwrap_or(defaults.charge_efficiency),
            fast_charge_threshold: raw
                .fast_charge_threshold
                .unwrap_or(defaults.fast_charge_threshold),
            slow_charge_factor: raw.slow_charge_factor.unwrap_or(defaults.slow_charge_factor),
        };

        Self {
            label: raw.label.unwrap_or_else(|| raw.id.clone()),
            id: VehicleId::new(raw.id),
            telemetry_path: raw.telemetry_path,
            profile,
        }
    }
}
