//! Charge time prediction from recorded sessions

use chargecurve_api::{ChargingSession, SessionKey};
use chargecurve_config::LearningPolicy;
use chargecurve_store::SessionHistory;
use std::collections::BTreeMap;
use tracing::debug;

/// Reported time remaining of one session, indexed by SoC.
///
/// SoC values are rounded to one decimal and stored as tenths of a percent.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeCurve {
    points: BTreeMap<i64, Vec<f64>>,
}

impl ChargeCurve {
    /// Build a curve from the samples that carry a time remaining.
    /// Returns `None` if there are none.
    pub fn from_session(session: &ChargingSession) -> Option<Self> {
        let mut points: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for point in &session.data_points {
            if let Some(time_remaining) = point.time_remaining {
                points
                    .entry(soc_tenths(point.soc))
                    .or_default()
                    .push(time_remaining);
            }
        }

        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    /// Number of distinct SoC values on the curve
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inverse-distance weighted time remaining at `current_soc`, using the
    /// `neighbours` SoC values closest to it. Ties keep ascending SoC order.
    pub fn time_remaining_at(&self, current_soc: f64, neighbours: usize, offset: f64) -> Option<f64> {
        let mut nearest: Vec<(f64, &Vec<f64>)> = self
            .points
            .iter()
            .map(|(tenths, times)| (*tenths as f64 / 10.0, times))
            .collect();
        nearest.sort_by(|a, b| {
            (a.0 - current_soc)
                .abs()
                .total_cmp(&(b.0 - current_soc).abs())
        });
        nearest.truncate(neighbours);

        let (weighted_sum, total_weight) =
            nearest
                .iter()
                .fold((0.0, 0.0), |(sum, total), (soc, times)| {
                    let weight = 1.0 / ((soc - current_soc).abs() + offset);
                    (sum + mean(times) * weight, total + weight)
                });

        if total_weight > 0.0 {
            Some(weighted_sum / total_weight)
        } else {
            None
        }
    }
}

/// Predicted minutes remaining for a charge in bucket `key` at `current_soc`.
///
/// Each recorded session of the bucket gives one estimate from its own curve;
/// the prediction is their plain average. Returns `None` if the bucket has
/// fewer sessions than the policy requires or no session has usable samples.
pub fn predict_time_remaining(
    history: &SessionHistory,
    key: &SessionKey,
    current_soc: f64,
    policy: &LearningPolicy,
) -> Option<f64> {
    let sessions = history.session_count(key);
    if sessions < policy.min_sessions_for_prediction {
        debug!(
            key = %key,
            sessions,
            required = policy.min_sessions_for_prediction,
            "Not enough sessions for prediction"
        );
        return None;
    }

    let estimates: Vec<f64> = history
        .sessions(key)
        .filter_map(ChargeCurve::from_session)
        .filter_map(|curve| {
            curve.time_remaining_at(current_soc, policy.neighbour_count, policy.distance_offset)
        })
        .collect();

    if estimates.is_empty() {
        debug!(key = %key, "No usable curves for prediction");
        return None;
    }

    let prediction = mean(&estimates);
    debug!(
        key = %key,
        current_soc,
        curves = estimates.len(),
        prediction,
        "Predicted time remaining"
    );
    Some(prediction)
}

/// Halfway values go to the even tenth
fn soc_tenths(soc: f64) -> i64 {
    (soc * 10.0).round_ties_even() as i64
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargecurve_api::DataPoint;
    use chrono::{Duration, Local, TimeZone};

    fn session(key: SessionKey, samples: &[(f64, Option<f64>)]) -> ChargingSession {
        let start = Local.with_ymd_and_hms(2025, 12, 25, 22, 0, 0).unwrap();
        ChargingSession {
            session_key: key,
            charger_category: key.category,
            target_soc: key.target_soc as f64,
            power_kw: 11.0,
            start_time: start,
            start_soc: samples.first().map(|s| s.0).unwrap_or(0.0),
            data_points: samples
                .iter()
                .enumerate()
                .map(|(i, (soc, time_remaining))| DataPoint {
                    timestamp: start + Duration::minutes(i as i64),
                    soc: *soc,
                    time_remaining: *time_remaining,
                    power_kw: 11.0,
                })
                .collect(),
            end_time: Some(start + Duration::hours(2)),
            end_soc: samples.last().map(|s| s.0),
            soc_gained: None,
            actual_duration_minutes: Some(120.0),
        }
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("expected a prediction");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn history_with(sessions: Vec<ChargingSession>) -> SessionHistory {
        let mut history = SessionHistory::new();
        for s in sessions {
            history.push(s, 50);
        }
        history
    }

    #[test]
    fn test_curve_skips_missing_time_remaining() {
        let key = SessionKey::for_charge(11.0, 80.0);
        let curve = ChargeCurve::from_session(&session(
            key,
            &[(40.0, None), (45.04, Some(100.0)), (45.0, Some(90.0))],
        ))
        .unwrap();

        assert_eq!(curve.len(), 1);
        assert_close(curve.time_remaining_at(45.0, 3, 0.1), 95.0);

        assert!(ChargeCurve::from_session(&session(key, &[(40.0, None)])).is_none());
        assert!(ChargeCurve::from_session(&session(key, &[])).is_none());
    }

    #[test]
    fn test_soc_rounds_half_to_even() {
        assert_eq!(soc_tenths(45.25), 452);
        assert_eq!(soc_tenths(45.75), 458);
        assert_eq!(soc_tenths(12.25), 122);
        assert_eq!(soc_tenths(45.26), 453);

        let key = SessionKey::for_charge(11.0, 80.0);
        let curve = ChargeCurve::from_session(&session(
            key,
            &[
                (45.2, Some(100.0)),
                (45.25, Some(80.0)),
                (45.75, Some(60.0)),
                (45.8, Some(40.0)),
            ],
        ))
        .unwrap();

        assert_eq!(curve.len(), 2);
        assert_close(curve.time_remaining_at(45.2, 1, 0.1), 90.0);
        assert_close(curve.time_remaining_at(45.8, 1, 0.1), 50.0);
    }

    #[test]
    fn test_weighted_neighbours() {
        let key = SessionKey::for_charge(11.0, 90.0);
        let curve =
            ChargeCurve::from_session(&session(key, &[(80.0, Some(30.0)), (85.0, Some(15.0))]))
                .unwrap();

        let estimate = curve.time_remaining_at(82.0, 3, 0.1).unwrap();
        let expected = (30.0 / 2.1 + 15.0 / 3.1) / (1.0 / 2.1 + 1.0 / 3.1);
        assert!((estimate - expected).abs() < 1e-9);
        assert!((estimate - 23.94).abs() < 0.01);
    }

    #[test]
    fn test_only_nearest_neighbours_count() {
        let key = SessionKey::for_charge(11.0, 100.0);
        let curve = ChargeCurve::from_session(&session(
            key,
            &[
                (10.0, Some(500.0)),
                (49.0, Some(60.0)),
                (50.0, Some(60.0)),
                (51.0, Some(60.0)),
            ],
        ))
        .unwrap();

        assert_close(curve.time_remaining_at(50.0, 3, 0.1), 60.0);
    }

    #[test]
    fn test_exact_match_dominates() {
        let key = SessionKey::for_charge(11.0, 100.0);
        let curve = ChargeCurve::from_session(&session(
            key,
            &[(50.0, Some(60.0)), (60.0, Some(10.0))],
        ))
        .unwrap();

        let estimate = curve.time_remaining_at(50.0, 3, 0.1).unwrap();
        assert!(estimate > 59.0 && estimate < 60.0);
    }

    #[test]
    fn test_prediction_needs_min_sessions() {
        let policy = LearningPolicy::default();
        let key = SessionKey::for_charge(11.0, 80.0);
        let samples = [(50.0, Some(60.0))];

        let empty = SessionHistory::new();
        assert_eq!(predict_time_remaining(&empty, &key, 50.0, &policy), None);

        let one = history_with(vec![session(key, &samples)]);
        assert_eq!(predict_time_remaining(&one, &key, 50.0, &policy), None);

        let two = history_with(vec![session(key, &samples), session(key, &samples)]);
        assert_close(predict_time_remaining(&two, &key, 50.0, &policy), 60.0);
    }

    #[test]
    fn test_prediction_averages_sessions() {
        let policy = LearningPolicy::default();
        let key = SessionKey::for_charge(11.0, 80.0);
        let history = history_with(vec![
            session(key, &[(50.0, Some(60.0))]),
            session(key, &[(50.0, Some(80.0))]),
            // no usable samples, ignored
            session(key, &[(50.0, None)]),
            session(key, &[]),
        ]);

        assert_close(predict_time_remaining(&history, &key, 50.0, &policy), 70.0);
    }

    #[test]
    fn test_prediction_without_usable_samples() {
        let policy = LearningPolicy::default();
        let key = SessionKey::for_charge(22.0, 80.0);
        let history = history_with(vec![
            session(key, &[(50.0, None)]),
            session(key, &[(60.0, None)]),
        ]);

        assert_eq!(predict_time_remaining(&history, &key, 55.0, &policy), None);
    }

    #[test]
    fn test_prediction_only_uses_its_bucket() {
        let policy = LearningPolicy::default();
        let key = SessionKey::for_charge(11.0, 80.0);
        let other = SessionKey::for_charge(50.0, 80.0);
        let history = history_with(vec![
            session(other, &[(50.0, Some(20.0))]),
            session(other, &[(50.0, Some(20.0))]),
        ]);

        assert_eq!(predict_time_remaining(&history, &key, 50.0, &policy), None);
        assert_close(predict_time_remaining(&history, &other, 50.0, &policy), 20.0);
    }
}
