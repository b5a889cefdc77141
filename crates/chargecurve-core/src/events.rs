//! Core events emitted by the learner

use chargecurve_api::SessionKey;
use chargecurve_util::VehicleId;
use chrono::{DateTime, Local};

/// Events emitted by the charge learner
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// A new session was opened
    SessionStarted {
        vehicle_id: VehicleId,
        session_key: SessionKey,
        start_soc: f64,
        power_kw: f64,
        started_at: DateTime<Local>,
    },

    /// The open session was closed and added to the history
    SessionFinalized {
        vehicle_id: VehicleId,
        session_key: SessionKey,
        data_points: usize,
        soc_gained: Option<f64>,
        duration_minutes: Option<f64>,
        /// Oldest sessions dropped to respect the per-key cap
        evicted: usize,
    },

    /// History was written to the store
    HistorySaved {
        vehicle_id: VehicleId,
        total_sessions: usize,
    },

    /// Writing the history failed; the in-memory state is kept
    HistorySaveFailed {
        vehicle_id: VehicleId,
        error: String,
    },
}
