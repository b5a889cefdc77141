//! Charge learner: records sessions for one vehicle and predicts from them

use chargecurve_api::{BatteryProfile, ChargingSession, LearningStats, SessionKey, Telemetry};
use chargecurve_config::LearningPolicy;
use chargecurve_store::{HistoryStore, SessionHistory};
use chargecurve_util::VehicleId;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    ActiveSession, ChargeEstimate, CoreEvent, EstimateSource, SaveThrottle,
    predict_time_remaining, theoretical_minutes,
};

/// How the history in memory came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOrigin {
    /// Read from the store
    Loaded,
    /// The store had nothing yet
    New,
    /// The store could not be read; started empty
    Recovered,
}

/// Learns charge curves for a single vehicle
pub struct ChargeLearner {
    vehicle_id: VehicleId,
    policy: LearningPolicy,
    profile: BatteryProfile,
    store: Arc<dyn HistoryStore>,
    history: SessionHistory,
    origin: HistoryOrigin,
    current_session: Option<ActiveSession>,
    throttle: SaveThrottle,
}

impl ChargeLearner {
    /// Create a learner, loading any existing history from `store`
    pub fn new(
        vehicle_id: VehicleId,
        policy: LearningPolicy,
        profile: BatteryProfile,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        let (mut history, origin) = match store.load_history() {
            Ok(Some(history)) => (history, HistoryOrigin::Loaded),
            Ok(None) => (SessionHistory::new(), HistoryOrigin::New),
            Err(e) => {
                error!(
                    vehicle = %vehicle_id,
                    location = %store.location(),
                    error = %e,
                    "Failed to load charge history, starting empty"
                );
                (SessionHistory::new(), HistoryOrigin::Recovered)
            }
        };

        let evicted = history.enforce_limit(policy.max_sessions_per_key);
        if evicted > 0 {
            debug!(vehicle = %vehicle_id, evicted, "Trimmed loaded history to retention limit");
        }

        info!(
            vehicle = %vehicle_id,
            origin = ?origin,
            sessions = history.total_sessions(),
            keys = history.keys().count(),
            "Charge learner initialized"
        );

        Self {
            vehicle_id,
            policy,
            profile,
            store,
            history,
            origin,
            current_session: None,
            throttle: SaveThrottle::new(),
        }
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    pub fn history_origin(&self) -> HistoryOrigin {
        self.origin
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// The session currently being recorded
    pub fn current_session(&self) -> Option<&ChargingSession> {
        self.current_session.as_ref().map(ActiveSession::session)
    }

    pub fn is_charging(&self) -> bool {
        self.current_session.is_some()
    }

    /// Feed one telemetry sample.
    ///
    /// Samples are taken as given; validate them beforehand.
    pub fn record(&mut self, sample: &Telemetry, now: DateTime<Local>) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        if !sample.is_charging() {
            self.finalize_into(now, &mut events);
            return events;
        }

        let key = SessionKey::for_charge(sample.power_kw, sample.target_soc);
        let same_session = self
            .current_session
            .as_ref()
            .is_some_and(|session| session.key() == key);

        if !same_session {
            self.finalize_into(now, &mut events);

            info!(
                vehicle = %self.vehicle_id,
                key = %key,
                soc = sample.soc,
                power_kw = sample.power_kw,
                "Charging session started"
            );
            self.current_session = Some(ActiveSession::open(key, sample, now));
            events.push(CoreEvent::SessionStarted {
                vehicle_id: self.vehicle_id.clone(),
                session_key: key,
                start_soc: sample.soc,
                power_kw: sample.power_kw,
                started_at: now,
            });
        }

        if let Some(session) = self.current_session.as_mut() {
            session.record_point(sample, now);
        }

        if self
            .throttle
            .should_save(sample.soc, sample.time_remaining, &self.policy)
        {
            events.push(self.save());
            self.throttle.mark_saved(sample.soc, sample.time_remaining);
        }

        events
    }

    /// Close the open session, if any, as if charging had stopped at `now`
    pub fn finalize_session(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        self.finalize_into(now, &mut events);
        events
    }

    fn finalize_into(&mut self, now: DateTime<Local>, events: &mut Vec<CoreEvent>) {
        let Some(active) = self.current_session.take() else {
            return;
        };

        let session = active.finalize(now);
        let session_key = session.session_key;
        let data_points = session.data_points.len();
        let soc_gained = session.soc_gained;
        let duration_minutes = session.actual_duration_minutes;

        let evicted = self.history.push(session, self.policy.max_sessions_per_key);

        info!(
            vehicle = %self.vehicle_id,
            key = %session_key,
            data_points,
            soc_gained = ?soc_gained,
            duration_minutes = ?duration_minutes,
            "Charging session finalized"
        );

        events.push(CoreEvent::SessionFinalized {
            vehicle_id: self.vehicle_id.clone(),
            session_key,
            data_points,
            soc_gained,
            duration_minutes,
            evicted,
        });
        events.push(self.save());
        self.throttle.reset();
    }

    fn save(&self) -> CoreEvent {
        match self.store.save_history(&self.history) {
            Ok(()) => {
                debug!(
                    vehicle = %self.vehicle_id,
                    sessions = self.history.total_sessions(),
                    "Charge history saved"
                );
                CoreEvent::HistorySaved {
                    vehicle_id: self.vehicle_id.clone(),
                    total_sessions: self.history.total_sessions(),
                }
            }
            Err(e) => {
                error!(
                    vehicle = %self.vehicle_id,
                    location = %self.store.location(),
                    error = %e,
                    "Failed to save charge history"
                );
                CoreEvent::HistorySaveFailed {
                    vehicle_id: self.vehicle_id.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Learned minutes remaining to reach `target_soc` from `current_soc`
    /// at `power_kw`, if enough history exists for that charger and target
    pub fn predict(&self, current_soc: f64, target_soc: f64, power_kw: f64) -> Option<f64> {
        let key = SessionKey::for_charge(power_kw, target_soc);
        predict_time_remaining(&self.history, &key, current_soc, &self.policy)
    }

    /// Best available estimate: learned when possible, theoretical otherwise
    pub fn estimate(
        &self,
        current_soc: f64,
        target_soc: f64,
        power_kw: f64,
        now: DateTime<Local>,
    ) -> Option<ChargeEstimate> {
        if let Some(minutes) = self.predict(current_soc, target_soc, power_kw) {
            return Some(ChargeEstimate::new(minutes, EstimateSource::Learned, now));
        }

        theoretical_minutes(current_soc, target_soc, power_kw, &self.profile)
            .map(|minutes| ChargeEstimate::new(minutes, EstimateSource::Theoretical, now))
    }

    pub fn learning_stats(&self) -> LearningStats {
        self.history.stats()
    }
}
