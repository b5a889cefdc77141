//! Config validation CLI tool
//!
//! Validates a chargecurve configuration file and reports any errors.

use chargecurve_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a chargecurve configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match chargecurve_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", chargecurve_config::CURRENT_CONFIG_VERSION);
            println!("  Data directory: {}", config.daemon.data_dir.display());
            println!(
                "  Polling: {}s idle, {}s while charging",
                config.daemon.idle_poll.as_secs(),
                config.daemon.charging_poll.as_secs()
            );
            println!(
                "  Learning: keep {} sessions per key, predict from {}+ sessions",
                config.learning.max_sessions_per_key,
                config.learning.min_sessions_for_prediction
            );

            println!();
            println!("Vehicles:");
            for vehicle in &config.vehicles {
                let source = vehicle
                    .telemetry_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "no telemetry source".to_string());
                println!(
                    "  - {} [{} kWh]: {} ({})",
                    vehicle.id, vehicle.profile.battery_capacity_kwh, vehicle.label, source
                );
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                chargecurve_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                chargecurve_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                chargecurve_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                chargecurve_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        chargecurve_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
