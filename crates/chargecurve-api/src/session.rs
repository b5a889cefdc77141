//! Charging sessions and the samples they are made of

use chargecurve_util::iso8601;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{ChargerCategory, SessionKey};

/// One telemetry sample recorded during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Local>,

    /// State of charge, percent
    pub soc: f64,

    /// Vehicle-reported minutes until the target is reached
    pub time_remaining: Option<f64>,

    /// Instantaneous charging power, kW
    pub power_kw: f64,
}

/// A charging session, open while samples arrive and frozen once finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingSession {
    pub session_key: SessionKey,
    pub charger_category: ChargerCategory,

    /// Target SoC as reported (the key holds its integer part)
    pub target_soc: f64,

    /// Power of the sample that opened the session
    pub power_kw: f64,

    #[serde(with = "iso8601")]
    pub start_time: DateTime<Local>,
    pub start_soc: f64,

    /// Samples in arrival order
    #[serde(default)]
    pub data_points: Vec<DataPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub end_time: Option<DateTime<Local>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_soc: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soc_gained: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration_minutes: Option<f64>,
}

impl ChargingSession {
    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn last_point(&self) -> Option<&DataPoint> {
        self.data_points.last()
    }
}
