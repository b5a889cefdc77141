//! Telemetry samples supplied by the polling side

use chargecurve_util::iso8601;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Charging state as reported by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum ChargingStatus {
    Charging,
    NotCharging,
    Complete,
    Error,
    Unknown,
}

impl ChargingStatus {
    pub fn is_charging(self) -> bool {
        self == ChargingStatus::Charging
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChargingStatus::Charging => "CHARGING",
            ChargingStatus::NotCharging => "NOT_CHARGING",
            ChargingStatus::Complete => "COMPLETE",
            ChargingStatus::Error => "ERROR",
            ChargingStatus::Unknown => "UNKNOWN",
        }
    }
}

impl From<&str> for ChargingStatus {
    /// Host integrations disagree on casing and naming; anything unrecognised is `Unknown`.
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "CHARGING" => ChargingStatus::Charging,
            "NOT_CHARGING" | "READY" | "WAITING_FOR_CHARGING" | "PLUGGED_IN" => {
                ChargingStatus::NotCharging
            }
            "COMPLETE" | "FULLY_CHARGED" | "FINISHED_FULLY_CHARGED" | "TARGET_REACHED" => {
                ChargingStatus::Complete
            }
            "ERROR" | "FAULT" => ChargingStatus::Error,
            _ => ChargingStatus::Unknown,
        }
    }
}

impl From<String> for ChargingStatus {
    fn from(s: String) -> Self {
        ChargingStatus::from(s.as_str())
    }
}

impl fmt::Display for ChargingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One polling tick worth of charging telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// State of charge, percent
    pub soc: f64,

    /// Vehicle-reported minutes remaining, when available
    #[serde(default)]
    pub time_remaining: Option<f64>,

    /// Instantaneous charging power, kW
    pub power_kw: f64,

    /// Charge limit set on the vehicle, percent
    pub target_soc: f64,

    pub charging_status: ChargingStatus,

    /// When the sample was taken. Only replayed telemetry carries one;
    /// live samples are stamped on arrival.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub timestamp: Option<DateTime<Local>>,
}

impl Telemetry {
    pub fn new(
        soc: f64,
        time_remaining: Option<f64>,
        power_kw: f64,
        target_soc: f64,
        charging_status: ChargingStatus,
    ) -> Self {
        Self {
            soc,
            time_remaining,
            power_kw,
            target_soc,
            charging_status,
            timestamp: None,
        }
    }

    pub fn is_charging(&self) -> bool {
        self.charging_status.is_charging()
    }

    /// Reject samples the learner should never see.
    ///
    /// The learner itself takes values as given, so callers run this first.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        check_percent("soc", self.soc)?;
        check_percent("target_soc", self.target_soc)?;

        if !self.power_kw.is_finite() {
            return Err(TelemetryError::NotFinite("power_kw"));
        }
        if self.power_kw < 0.0 {
            return Err(TelemetryError::NegativePower(self.power_kw));
        }

        if let Some(minutes) = self.time_remaining {
            if !minutes.is_finite() {
                return Err(TelemetryError::NotFinite("time_remaining"));
            }
            if minutes < 0.0 {
                return Err(TelemetryError::NegativeTimeRemaining(minutes));
            }
        }

        Ok(())
    }
}

fn check_percent(field: &'static str, value: f64) -> Result<(), TelemetryError> {
    if !value.is_finite() {
        return Err(TelemetryError::NotFinite(field));
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(TelemetryError::OutOfRange { field, value });
    }
    Ok(())
}

/// Invalid telemetry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TelemetryError {
    #[error("{field} out of range 0-100: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{0} is not a finite number")]
    NotFinite(&'static str),

    #[error("Negative charging power: {0} kW")]
    NegativePower(f64),

    #[error("Negative time remaining: {0} min")]
    NegativeTimeRemaining(f64),
}
