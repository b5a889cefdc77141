//! Strongly-typed identifiers for chargecurve

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a managed vehicle (one learning instance, one history file)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be embedded in a file name as-is.
    ///
    /// Accepts non-empty ids made of ASCII letters, digits, `-` and `_`.
    pub fn is_file_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VehicleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VehicleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_id_equality() {
        let id1 = VehicleId::new("ix3");
        let id2 = VehicleId::new("ix3");
        let id3 = VehicleId::new("i4");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn file_safe_ids() {
        assert!(VehicleId::new("ix3").is_file_safe());
        assert!(VehicleId::new("garage_car-2").is_file_safe());

        assert!(!VehicleId::new("").is_file_safe());
        assert!(!VehicleId::new("../etc").is_file_safe());
        assert!(!VehicleId::new("my car").is_file_safe());
    }

    #[test]
    fn vehicle_id_serializes_as_string() {
        let id = VehicleId::new("ix3");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ix3\"");

        let parsed: VehicleId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
