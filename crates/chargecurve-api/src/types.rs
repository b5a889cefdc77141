//! Shared types for chargecurve

use chargecurve_util::iso8601;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Charger power bucket, derived from instantaneous charging power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChargerCategory {
    /// Home wallbox, 5-9 kW
    #[serde(rename = "7kw")]
    Kw7,
    /// Three-phase wallbox, 9-15 kW
    #[serde(rename = "11kw")]
    Kw11,
    /// Public AC, 15-30 kW
    #[serde(rename = "22kw")]
    Kw22,
    /// DC fast charging, 30-70 kW
    #[serde(rename = "50kw")]
    Kw50,
    /// DC high power charging, 70-200 kW
    #[serde(rename = "150kw")]
    Kw150,
}

impl ChargerCategory {
    /// All categories, smallest first
    pub const ALL: [ChargerCategory; 5] = [
        ChargerCategory::Kw7,
        ChargerCategory::Kw11,
        ChargerCategory::Kw22,
        ChargerCategory::Kw50,
        ChargerCategory::Kw150,
    ];

    /// Power range in kW as `[min, max)`
    pub fn power_range(self) -> (f64, f64) {
        match self {
            ChargerCategory::Kw7 => (5.0, 9.0),
            ChargerCategory::Kw11 => (9.0, 15.0),
            ChargerCategory::Kw22 => (15.0, 30.0),
            ChargerCategory::Kw50 => (30.0, 70.0),
            ChargerCategory::Kw150 => (70.0, 200.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChargerCategory::Kw7 => "7kw",
            ChargerCategory::Kw11 => "11kw",
            ChargerCategory::Kw22 => "22kw",
            ChargerCategory::Kw50 => "50kw",
            ChargerCategory::Kw150 => "150kw",
        }
    }

    /// Map a power reading to exactly one category.
    ///
    /// The bucket whose `[min, max)` range contains `power_kw` wins. Values
    /// outside every range fall to the smallest bucket whose `max` exceeds
    /// them, or to the largest bucket above all ranges (and for NaN).
    pub fn categorize(power_kw: f64) -> Self {
        let in_range = Self::ALL.into_iter().find(|c| {
            let (min, max) = c.power_range();
            min <= power_kw && power_kw < max
        });
        if let Some(category) = in_range {
            return category;
        }

        Self::ALL
            .into_iter()
            .find(|c| power_kw < c.power_range().1)
            .unwrap_or(ChargerCategory::Kw150)
    }
}

impl fmt::Display for ChargerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargerCategory {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| KeyParseError::UnknownCategory(s.to_string()))
    }
}

/// Error parsing a category or session key string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("Unknown charger category: {0}")]
    UnknownCategory(String),

    #[error("Malformed session key '{0}': expected <category>_<target_soc>")]
    Malformed(String),

    #[error("Invalid target SoC in session key '{0}'")]
    InvalidTarget(String),
}

/// Partition key of the session history: charger category plus integer target SoC.
///
/// Serialized as `"{category}_{target_soc}"`, e.g. `"11kw_80"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SessionKey {
    pub category: ChargerCategory,
    pub target_soc: i32,
}

impl SessionKey {
    /// Build a key, truncating the target SoC down to an integer
    pub fn new(category: ChargerCategory, target_soc: f64) -> Self {
        Self {
            category,
            target_soc: target_soc.floor() as i32,
        }
    }

    /// Key for a charge at `power_kw` towards `target_soc`
    pub fn for_charge(power_kw: f64, target_soc: f64) -> Self {
        Self::new(ChargerCategory::categorize(power_kw), target_soc)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.category, self.target_soc)
    }
}

impl FromStr for SessionKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, target) = s
            .split_once('_')
            .ok_or_else(|| KeyParseError::Malformed(s.to_string()))?;
        let category = category.parse()?;
        let target_soc = target
            .parse()
            .map_err(|_| KeyParseError::InvalidTarget(s.to_string()))?;
        Ok(Self {
            category,
            target_soc,
        })
    }
}

impl From<SessionKey> for String {
    fn from(key: SessionKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for SessionKey {
    type Error = KeyParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Battery characteristics used for theoretical charge time estimates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryProfile {
    /// Usable capacity in kWh
    pub battery_capacity_kwh: f64,

    /// Fraction of grid energy that ends up in the battery
    pub charge_efficiency: f64,

    /// SoC above which the vehicle tapers charging power
    pub fast_charge_threshold: f64,

    /// Power multiplier applied above the fast charge threshold
    pub slow_charge_factor: f64,
}

impl Default for BatteryProfile {
    fn default() -> Self {
        Self {
            battery_capacity_kwh: 80.0,
            charge_efficiency: 0.9,
            fast_charge_threshold: 80.0,
            slow_charge_factor: 0.5,
        }
    }
}

/// Summary of what has been learned so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_sessions: usize,
    pub categories: BTreeMap<SessionKey, KeyStats>,
}

/// Per-key learning summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStats {
    pub count: usize,

    /// End time of the most recent session, if it was finalized
    #[serde(default, with = "iso8601::option")]
    pub latest: Option<DateTime<Local>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorize_in_range() {
        assert_eq!(ChargerCategory::categorize(7.4), ChargerCategory::Kw7);
        assert_eq!(ChargerCategory::categorize(11.0), ChargerCategory::Kw11);
        assert_eq!(ChargerCategory::categorize(22.0), ChargerCategory::Kw22);
        assert_eq!(ChargerCategory::categorize(50.0), ChargerCategory::Kw50);
        assert_eq!(ChargerCategory::categorize(150.0), ChargerCategory::Kw150);
    }

    #[test]
    fn categorize_half_open_boundaries() {
        assert_eq!(ChargerCategory::categorize(8.999), ChargerCategory::Kw7);
        assert_eq!(ChargerCategory::categorize(9.0), ChargerCategory::Kw11);
        assert_eq!(ChargerCategory::categorize(14.999), ChargerCategory::Kw11);
        assert_eq!(ChargerCategory::categorize(15.0), ChargerCategory::Kw22);
        assert_eq!(ChargerCategory::categorize(30.0), ChargerCategory::Kw50);
        assert_eq!(ChargerCategory::categorize(70.0), ChargerCategory::Kw150);
    }

    #[test]
    fn categorize_out_of_range_clamps() {
        assert_eq!(ChargerCategory::categorize(-10.0), ChargerCategory::Kw7);
        assert_eq!(ChargerCategory::categorize(0.0), ChargerCategory::Kw7);
        assert_eq!(ChargerCategory::categorize(3.7), ChargerCategory::Kw7);
        assert_eq!(ChargerCategory::categorize(200.0), ChargerCategory::Kw150);
        assert_eq!(ChargerCategory::categorize(500.0), ChargerCategory::Kw150);
        assert_eq!(ChargerCategory::categorize(f64::INFINITY), ChargerCategory::Kw150);
        assert_eq!(ChargerCategory::categorize(f64::NAN), ChargerCategory::Kw150);
    }

    #[test]
    fn categorize_is_total() {
        // Every tenth of a kW from -10 to 500 lands in exactly one known bucket
        for tenth in -100..=5000 {
            let power = tenth as f64 / 10.0;
            let category = ChargerCategory::categorize(power);
            assert!(ChargerCategory::ALL.contains(&category));

            let (min, max) = category.power_range();
            if power >= 5.0 && power < 200.0 {
                assert!(min <= power && power < max, "{} kW -> {}", power, category);
            }
        }
    }

    #[test]
    fn session_key_floors_target() {
        let key = SessionKey::new(ChargerCategory::Kw11, 80.9);
        assert_eq!(key.target_soc, 80);
        assert_eq!(key, SessionKey::for_charge(11.0, 80.0));
        assert_ne!(key, SessionKey::for_charge(11.0, 81.0));
        assert_ne!(key, SessionKey::for_charge(22.0, 80.0));
    }

    #[test]
    fn session_key_string_form() {
        let key = SessionKey::for_charge(7.4, 100.0);
        assert_eq!(key.to_string(), "7kw_100");
        assert_eq!("7kw_100".parse::<SessionKey>().unwrap(), key);

        assert!(matches!(
            "fast_80".parse::<SessionKey>(),
            Err(KeyParseError::UnknownCategory(_))
        ));
        assert!(matches!(
            "11kw".parse::<SessionKey>(),
            Err(KeyParseError::Malformed(_))
        ));
        assert!(matches!(
            "11kw_eighty".parse::<SessionKey>(),
            Err(KeyParseError::InvalidTarget(_))
        ));
    }

    #[test]
    fn session_key_as_json_map_key() {
        let mut map = BTreeMap::new();
        map.insert(SessionKey::for_charge(11.0, 80.0), 1);
        map.insert(SessionKey::for_charge(50.0, 100.0), 2);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"11kw_80":1,"50kw_100":2}"#);

        let parsed: BTreeMap<SessionKey, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&ChargerCategory::Kw150).unwrap();
        assert_eq!(json, "\"150kw\"");
        assert_eq!("22kw".parse::<ChargerCategory>().unwrap(), ChargerCategory::Kw22);
    }
}
