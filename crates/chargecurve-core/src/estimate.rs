//! Charge time estimates

use chargecurve_api::BatteryProfile;
use chargecurve_util::add_minutes;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where an estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// Derived from recorded sessions
    Learned,
    /// Derived from the battery profile
    Theoretical,
}

/// A charge time estimate with its expected completion time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeEstimate {
    pub minutes: f64,
    pub source: EstimateSource,

    /// `None` when `minutes` puts completion beyond any representable date
    #[serde(default, skip_serializing_if = "Option::is_none", with = "chargecurve_util::iso8601::option")]
    pub completes_at: Option<DateTime<Local>>,
}

impl ChargeEstimate {
    pub fn new(minutes: f64, source: EstimateSource, now: DateTime<Local>) -> Self {
        let completes_at = add_minutes(now, minutes);
        if completes_at.is_none() {
            warn!(minutes, source = ?source, "Charge estimate has no representable completion time");
        }

        Self {
            minutes,
            source,
            completes_at,
        }
    }
}

/// Minutes needed to charge from `current_soc` to `target_soc` at `power_kw`.
///
/// Above the profile's fast charge threshold the power is scaled down by the
/// slow charge factor. Returns `Some(0.0)` when the target is already reached
/// and `None` when the power is unusable.
pub fn theoretical_minutes(
    current_soc: f64,
    target_soc: f64,
    power_kw: f64,
    profile: &BatteryProfile,
) -> Option<f64> {
    if current_soc >= target_soc {
        return Some(0.0);
    }
    if !(power_kw.is_finite() && power_kw > 0.0) {
        return None;
    }

    let energy_kwh = |from: f64, to: f64| {
        (to - from) / 100.0 * profile.battery_capacity_kwh / profile.charge_efficiency
    };
    let threshold = profile.fast_charge_threshold;

    let hours = if target_soc <= threshold {
        energy_kwh(current_soc, target_soc) / power_kw
    } else {
        let fast_hours = if current_soc < threshold {
            energy_kwh(current_soc, threshold) / power_kw
        } else {
            0.0
        };
        let slow_hours =
            energy_kwh(current_soc.max(threshold), target_soc) / (power_kw * profile.slow_charge_factor);
        fast_hours + slow_hours
    };

    Some(hours * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("expected an estimate");
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_below_threshold() {
        // 40 -> 80 on 80 kWh at 90%: 35.56 kWh at 11 kW
        let minutes = theoretical_minutes(40.0, 80.0, 11.0, &BatteryProfile::default());
        assert_close(minutes, 32.0 / 0.9 / 11.0 * 60.0);
    }

    #[test]
    fn test_crosses_threshold() {
        let profile = BatteryProfile::default();
        let minutes = theoretical_minutes(70.0, 90.0, 50.0, &profile);

        let fast = 8.0 / 0.9 / 50.0;
        let slow = 8.0 / 0.9 / 25.0;
        assert_close(minutes, (fast + slow) * 60.0);
    }

    #[test]
    fn test_starts_above_threshold() {
        let profile = BatteryProfile::default();
        let minutes = theoretical_minutes(90.0, 100.0, 11.0, &profile);
        assert_close(minutes, 8.0 / 0.9 / 5.5 * 60.0);
    }

    #[test]
    fn test_target_reached() {
        let profile = BatteryProfile::default();
        assert_eq!(theoretical_minutes(80.0, 80.0, 11.0, &profile), Some(0.0));
        assert_eq!(theoretical_minutes(85.0, 80.0, 0.0, &profile), Some(0.0));
    }

    #[test]
    fn test_unusable_power() {
        let profile = BatteryProfile::default();
        assert_eq!(theoretical_minutes(20.0, 80.0, 0.0, &profile), None);
        assert_eq!(theoretical_minutes(20.0, 80.0, -3.0, &profile), None);
        assert_eq!(theoretical_minutes(20.0, 80.0, f64::NAN, &profile), None);
    }

    #[test]
    fn test_estimate_completion_time() {
        let now = Local.with_ymd_and_hms(2025, 12, 25, 22, 0, 0).unwrap();
        let estimate = ChargeEstimate::new(90.0, EstimateSource::Learned, now);
        assert_eq!(
            estimate.completes_at,
            Some(Local.with_ymd_and_hms(2025, 12, 25, 23, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_trickle_power_estimate_has_no_completion_time() {
        let now = Local.with_ymd_and_hms(2025, 12, 25, 22, 0, 0).unwrap();
        let minutes = theoretical_minutes(40.0, 80.0, 1e-9, &BatteryProfile::default()).unwrap();
        assert!(minutes > 1e12);

        let estimate = ChargeEstimate::new(minutes, EstimateSource::Theoretical, now);
        assert_eq!(estimate.minutes, minutes);
        assert_eq!(estimate.completes_at, None);

        let json = serde_json::to_string(&estimate).unwrap();
        assert!(!json.contains("completes_at"));
    }

    #[test]
    fn test_huge_learned_estimate_has_no_completion_time() {
        let now = Local.with_ymd_and_hms(2025, 12, 25, 22, 0, 0).unwrap();
        let estimate = ChargeEstimate::new(1e15, EstimateSource::Learned, now);
        assert_eq!(estimate.completes_at, None);
    }
}
