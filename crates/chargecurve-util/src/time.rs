//! Time utilities for chargecurve
//!
//! Provides the wall clock used to stamp charging samples, conversions
//! between timestamps and minutes, and the timestamp format used in history
//! files.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `CHARGECURVE_MOCK_TIME` environment variable can be set
//! to override the system time. Mock time advances at the same rate as real time.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 22:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "CHARGECURVE_MOCK_TIME";

/// Format accepted for mock time
const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset-less ISO-8601 layouts accepted when reading older history files
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Cached mock time offset from the real time when the process started.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // Internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT)
                    .ok()
                    .and_then(|naive| Local.from_local_datetime(&naive).single())
                {
                    Some(mock_dt) => {
                        let offset = mock_dt.signed_duration_since(chrono::Local::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    None => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = MOCK_TIME_FORMAT,
                            "Invalid mock time"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // Wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Elapsed wall-clock time between two instants, in fractional minutes.
///
/// Negative when `end` is before `start`.
pub fn minutes_between(start: DateTime<Local>, end: DateTime<Local>) -> f64 {
    let elapsed = end.signed_duration_since(start);
    match elapsed.num_microseconds() {
        Some(us) => us as f64 / 60_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 60_000.0,
    }
}

/// Add a (possibly fractional) number of minutes to a timestamp.
///
/// Returns `None` when `minutes` is not finite or the result falls outside
/// the range chrono can represent.
pub fn add_minutes(dt: DateTime<Local>, minutes: f64) -> Option<DateTime<Local>> {
    if !minutes.is_finite() {
        return None;
    }
    let millis = (minutes * 60_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64).and_then(|delta| dt.checked_add_signed(delta))
}

/// Parse an ISO-8601 timestamp.
///
/// RFC 3339 strings with an offset are converted to local time. Strings
/// without an offset are interpreted as local time.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

/// Format a DateTime for display as a clock time.
pub fn format_clock_time(dt: &DateTime<Local>) -> String {
    dt.format("%H:%M").to_string()
}

/// Serde adapter for `DateTime<Local>` fields.
///
/// Writes RFC 3339; reads anything [`parse_timestamp`] accepts.
pub mod iso8601 {
    use chrono::{DateTime, Local};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(dt: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Local>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", s)))
    }

    /// Same as the parent module, for `Option<DateTime<Local>>`.
    pub mod option {
        use chrono::{DateTime, Local};
        use serde::{Deserialize, Deserializer, Serializer, de};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Local>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Local>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => super::super::parse_timestamp(&s)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", s))),
                None => Ok(None),
            }
        }
    }
}
