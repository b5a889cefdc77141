//! Configuration parsing and validation for chargecurve
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Daemon paths and polling intervals
//! - Learning and prediction tuning
//! - Per-vehicle battery profiles and telemetry sources
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    debug!(
        path = %path.display(),
        vehicles = config.vehicles.len(),
        "Configuration parsed"
    );
    Ok(config)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Config::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use chargecurve_util::VehicleId;
    use std::io::Write;

    #[test]
    fn parse_minimal_config() {
        let config = r#"
            config_version = 1

            [[vehicles]]
            id = "ix3"
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.vehicles.len(), 1);
        assert_eq!(config.vehicles[0].id.as_str(), "ix3");
        assert_eq!(config.learning, LearningPolicy::default());
    }

    #[test]
    fn reject_wrong_version() {
        let config = r#"
            config_version = 99

            [[vehicles]]
            id = "ix3"
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [learning]
            neighbour_count = 0

            [[vehicles]]
            id = "ix3"
            charge_efficiency = 1.5
        "#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn reject_malformed_toml() {
        let result = parse_config("config_version = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            config_version = 1

            [[vehicles]]
            id = "ix3"
            label = "BMW iX3"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        let vehicle = config.get_vehicle(&VehicleId::new("ix3")).unwrap();
        assert_eq!(vehicle.label, "BMW iX3");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
