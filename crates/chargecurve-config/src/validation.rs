//! Configuration validation

use crate::schema::{RawConfig, RawDaemonConfig, RawLearningConfig, RawVehicle};
use chargecurve_util::VehicleId;
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Vehicle '{vehicle_id}': {message}")]
    VehicleError { vehicle_id: String, message: String },

    #[error("Duplicate vehicle ID: {0}")]
    DuplicateVehicleId(String),

    #[error("learning.{field}: {message}")]
    LearningError { field: &'static str, message: String },

    #[error("daemon.{field}: {message}")]
    DaemonError { field: &'static str, message: String },

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.vehicles.is_empty() {
        errors.push(ValidationError::GlobalError(
            "at least one vehicle must be configured".into(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for vehicle in &config.vehicles {
        if !seen_ids.insert(&vehicle.id) {
            errors.push(ValidationError::DuplicateVehicleId(vehicle.id.clone()));
        }
    }

    for vehicle in &config.vehicles {
        errors.extend(validate_vehicle(vehicle));
    }

    errors.extend(validate_learning(&config.learning));
    errors.extend(validate_daemon(&config.daemon));

    errors
}

fn validate_vehicle(vehicle: &RawVehicle) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut fail = |message: String| {
        errors.push(ValidationError::VehicleError {
            vehicle_id: vehicle.id.clone(),
            message,
        })
    };

    if !VehicleId::new(vehicle.id.as_str()).is_file_safe() {
        fail("id must be non-empty and contain only letters, digits, '-' or '_'".into());
    }

    if let Some(capacity) = vehicle.battery_capacity_kwh
        && !(capacity.is_finite() && capacity > 0.0)
    {
        fail(format!("battery_capacity_kwh must be positive, got {}", capacity));
    }

    if let Some(efficiency) = vehicle.charge_efficiency
        && !is_unit_fraction(efficiency)
    {
        fail(format!("charge_efficiency must be in (0, 1], got {}", efficiency));
    }

    if let Some(threshold) = vehicle.fast_charge_threshold
        && !(0.0..=100.0).contains(&threshold)
    {
        fail(format!("fast_charge_threshold must be 0-100, got {}", threshold));
    }

    if let Some(factor) = vehicle.slow_charge_factor
        && !is_unit_fraction(factor)
    {
        fail(format!("slow_charge_factor must be in (0, 1], got {}", factor));
    }

    errors
}

fn validate_learning(learning: &RawLearningConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError::LearningError { field, message })
    };

    if learning.max_sessions_per_key == Some(0) {
        fail("max_sessions_per_key", "must be at least 1".into());
    }
    if learning.min_sessions_for_prediction == Some(0) {
        fail("min_sessions_for_prediction", "must be at least 1".into());
    }
    if learning.neighbour_count == Some(0) {
        fail("neighbour_count", "must be at least 1".into());
    }

    if let Some(offset) = learning.distance_offset
        && !(offset.is_finite() && offset > 0.0)
    {
        fail("distance_offset", format!("must be positive, got {}", offset));
    }

    for (field, value) in [
        ("soc_save_delta", learning.soc_save_delta),
        ("time_save_delta_minutes", learning.time_save_delta_minutes),
    ] {
        if let Some(delta) = value
            && !(delta.is_finite() && delta >= 0.0)
        {
            fail(field, format!("must not be negative, got {}", delta));
        }
    }

    errors
}

fn validate_daemon(daemon: &RawDaemonConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("idle_poll_seconds", daemon.idle_poll_seconds),
        ("charging_poll_seconds", daemon.charging_poll_seconds),
    ] {
        if value == Some(0) {
            errors.push(ValidationError::DaemonError {
                field,
                message: "must be at least 1 second".into(),
            });
        }
    }

    errors
}

fn is_unit_fraction(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}
