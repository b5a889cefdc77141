//! Open session tracking and save throttling

use chargecurve_api::{ChargingSession, DataPoint, SessionKey, Telemetry};
use chargecurve_config::LearningPolicy;
use chargecurve_util::minutes_between;
use chrono::{DateTime, Local};

/// The session currently receiving samples
#[derive(Debug)]
pub struct ActiveSession {
    session: ChargingSession,
}

impl ActiveSession {
    /// Open a session for `key`, starting at the sample's SoC.
    /// The sample itself is not recorded; call [`ActiveSession::record_point`].
    pub fn open(key: SessionKey, sample: &Telemetry, now: DateTime<Local>) -> Self {
        Self {
            session: ChargingSession {
                session_key: key,
                charger_category: key.category,
                target_soc: sample.target_soc,
                power_kw: sample.power_kw,
                start_time: now,
                start_soc: sample.soc,
                data_points: Vec::new(),
                end_time: None,
                end_soc: None,
                soc_gained: None,
                actual_duration_minutes: None,
            },
        }
    }

    pub fn key(&self) -> SessionKey {
        self.session.session_key
    }

    pub fn session(&self) -> &ChargingSession {
        &self.session
    }

    /// Append a sample
    pub fn record_point(&mut self, sample: &Telemetry, now: DateTime<Local>) {
        self.session.data_points.push(DataPoint {
            timestamp: now,
            soc: sample.soc,
            time_remaining: sample.time_remaining,
            power_kw: sample.power_kw,
        });
    }

    /// Close the session and compute its summary.
    ///
    /// Sessions without samples only get an end time.
    pub fn finalize(self, now: DateTime<Local>) -> ChargingSession {
        let mut session = self.session;
        session.end_time = Some(now);

        if let Some(end_soc) = session.last_point().map(|p| p.soc) {
            session.end_soc = Some(end_soc);
            session.soc_gained = Some(end_soc - session.start_soc);
            session.actual_duration_minutes = Some(minutes_between(session.start_time, now));
        }

        session
    }
}

/// Remembers the values at the last save so that samples only trigger a
/// save once SoC or time remaining has moved far enough.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SaveThrottle {
    last_soc: Option<f64>,
    last_time_remaining: Option<f64>,
}

impl SaveThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a sample should trigger a save.
    ///
    /// True for the first sample since the last save/reset, when SoC moved by
    /// at least `soc_save_delta`, or when both the saved and current time
    /// remaining are known and differ by at least `time_save_delta_minutes`.
    pub fn should_save(&self, soc: f64, time_remaining: Option<f64>, policy: &LearningPolicy) -> bool {
        let Some(last_soc) = self.last_soc else {
            return true;
        };

        if (soc - last_soc).abs() >= policy.soc_save_delta {
            return true;
        }

        match (time_remaining, self.last_time_remaining) {
            (Some(current), Some(last)) => (current - last).abs() >= policy.time_save_delta_minutes,
            _ => false,
        }
    }

    pub fn mark_saved(&mut self, soc: f64, time_remaining: Option<f64>) {
        self.last_soc = Some(soc);
        self.last_time_remaining = time_remaining;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargecurve_api::ChargingStatus;
    use chrono::{Duration, TimeZone};

    fn charging(soc: f64, time_remaining: Option<f64>) -> Telemetry {
        Telemetry::new(soc, time_remaining, 11.0, 80.0, ChargingStatus::Charging)
    }

    #[test]
    fn test_session_lifecycle() {
        let t0 = Local.with_ymd_and_hms(2025, 12, 25, 22, 0, 0).unwrap();
        let key = SessionKey::for_charge(11.0, 80.0);

        let mut session = ActiveSession::open(key, &charging(40.0, Some(180.0)), t0);
        assert_eq!(session.key(), key);
        assert_eq!(session.session().start_soc, 40.0);
        assert!(session.session().data_points.is_empty());

        session.record_point(&charging(40.0, Some(180.0)), t0);
        session.record_point(&charging(52.5, Some(120.0)), t0 + Duration::minutes(60));

        let finalized = session.finalize(t0 + Duration::minutes(90));
        assert!(finalized.is_finalized());
        assert_eq!(finalized.end_soc, Some(52.5));
        assert_eq!(finalized.soc_gained, Some(12.5));
        assert_eq!(finalized.actual_duration_minutes, Some(90.0));
        assert_eq!(finalized.data_points.len(), 2);
    }

    #[test]
    fn test_empty_session_finalizes_without_summary() {
        let t0 = Local.with_ymd_and_hms(2025, 12, 25, 22, 0, 0).unwrap();
        let key = SessionKey::for_charge(7.4, 100.0);

        let finalized = ActiveSession::open(key, &charging(30.0, None), t0)
            .finalize(t0 + Duration::minutes(1));

        assert_eq!(finalized.end_time, Some(t0 + Duration::minutes(1)));
        assert_eq!(finalized.end_soc, None);
        assert_eq!(finalized.soc_gained, None);
        assert_eq!(finalized.actual_duration_minutes, None);
    }

    #[test]
    fn test_throttle_first_sample_saves() {
        let policy = LearningPolicy::default();
        let throttle = SaveThrottle::new();
        assert!(throttle.should_save(40.0, None, &policy));
    }

    #[test]
    fn test_throttle_soc_delta() {
        let policy = LearningPolicy::default();
        let mut throttle = SaveThrottle::new();
        throttle.mark_saved(40.0, Some(120.0));

        assert!(!throttle.should_save(44.9, Some(115.0), &policy));
        assert!(throttle.should_save(45.0, Some(115.0), &policy));
    }

    #[test]
    fn test_throttle_time_delta_needs_both_values() {
        let policy = LearningPolicy::default();
        let mut throttle = SaveThrottle::new();
        throttle.mark_saved(40.0, Some(120.0));

        assert!(!throttle.should_save(41.0, Some(110.5), &policy));
        assert!(throttle.should_save(41.0, Some(110.0), &policy));
        assert!(!throttle.should_save(41.0, None, &policy));

        throttle.mark_saved(41.0, None);
        assert!(!throttle.should_save(41.5, Some(10.0), &policy));
    }

    #[test]
    fn test_throttle_reset() {
        let policy = LearningPolicy::default();
        let mut throttle = SaveThrottle::new();
        throttle.mark_saved(40.0, Some(120.0));
        assert!(!throttle.should_save(40.0, Some(120.0), &policy));

        throttle.reset();
        assert_eq!(throttle, SaveThrottle::default());
        assert!(throttle.should_save(40.0, Some(120.0), &policy));
    }
}
