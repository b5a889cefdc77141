//! chargecurved - The chargecurve background service
//!
//! This is the main entry point for the chargecurved service.
//! It wires together all the components:
//! - Configuration loading
//! - One JSON history store and charge learner per vehicle
//! - Telemetry polling (`run`) and historic imports (`replay`)
//! - One-shot queries (`predict`, `stats`)

mod service;
mod source;

use anyhow::{Context, Result};
use chargecurve_api::{LearningStats, SessionKey};
use chargecurve_config::{Config, Vehicle, load_config};
use chargecurve_core::{ChargeEstimate, ChargeLearner, CoreEvent, theoretical_minutes};
use chargecurve_store::JsonFileStore;
use chargecurve_util::{VehicleId, default_config_path, is_mock_time_active};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::service::Service;
use crate::source::parse_replay;

/// chargecurved - EV charge curve learning service
#[derive(Parser, Debug)]
#[command(name = "chargecurved")]
#[command(about = "Learns EV charge curves from telemetry and predicts charge times", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/chargecurve/config.toml)
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set CHARGECURVE_DATA_DIR env var)
    #[arg(short, long, global = true, env = "CHARGECURVE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll telemetry and learn from charging sessions (default)
    Run,

    /// Print the learned and theoretical charge time for one vehicle
    Predict {
        #[arg(long)]
        vehicle: String,

        /// Current state of charge, percent
        #[arg(long)]
        soc: f64,

        /// Target state of charge, percent
        #[arg(long)]
        target: f64,

        /// Charging power, kW
        #[arg(long)]
        power: f64,
    },

    /// Print learning statistics as JSON
    Stats {
        /// Only this vehicle
        #[arg(long)]
        vehicle: Option<String>,
    },

    /// Import timestamped telemetry (JSON Lines) into a vehicle's history
    Replay {
        #[arg(long)]
        vehicle: String,

        file: PathBuf,
    },
}

/// Loaded configuration plus the effective data directory
struct App {
    config: Config,
    data_dir: PathBuf,
}

impl App {
    fn load(args: &Args) -> Result<Self> {
        let config = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| config.daemon.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        info!(
            config_path = %args.config.display(),
            data_dir = %data_dir.display(),
            vehicles = config.vehicles.len(),
            "Configuration loaded"
        );

        Ok(Self { config, data_dir })
    }

    fn vehicle(&self, id: &str) -> Result<&Vehicle> {
        self.config
            .get_vehicle(&VehicleId::new(id))
            .with_context(|| format!("Unknown vehicle '{}'", id))
    }

    fn learner(&self, vehicle: &Vehicle) -> ChargeLearner {
        let store = Arc::new(JsonFileStore::for_vehicle(&self.data_dir, &vehicle.id));
        ChargeLearner::new(
            vehicle.id.clone(),
            self.config.learning,
            vehicle.profile,
            store,
        )
    }
}

#[derive(Debug, Serialize)]
struct PredictionReport {
    vehicle: String,
    session_key: SessionKey,
    learned_minutes: Option<f64>,
    theoretical_minutes: Option<f64>,
    estimate: Option<ChargeEstimate>,
}

async fn run(app: App) -> Result<()> {
    let learners = app
        .config
        .vehicles
        .iter()
        .map(|vehicle| (vehicle.clone(), app.learner(vehicle)))
        .collect();

    let service = Service::new(&app.config.daemon, learners)?;
    service.run().await
}

fn predict(app: &App, vehicle: &str, soc: f64, target: f64, power: f64) -> Result<()> {
    let vehicle = app.vehicle(vehicle)?;
    let learner = app.learner(vehicle);

    let report = PredictionReport {
        vehicle: vehicle.id.to_string(),
        session_key: SessionKey::for_charge(power, target),
        learned_minutes: learner.predict(soc, target, power),
        theoretical_minutes: theoretical_minutes(soc, target, power, &vehicle.profile),
        estimate: learner.estimate(soc, target, power, chargecurve_util::now()),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn stats(app: &App, vehicle: Option<&str>) -> Result<()> {
    let vehicles: Vec<&Vehicle> = match vehicle {
        Some(id) => vec![app.vehicle(id)?],
        None => app.config.vehicles.iter().collect(),
    };

    let stats: BTreeMap<String, LearningStats> = vehicles
        .into_iter()
        .map(|vehicle| (vehicle.id.to_string(), app.learner(vehicle).learning_stats()))
        .collect();

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn replay(app: &App, vehicle: &str, file: &Path) -> Result<()> {
    let vehicle = app.vehicle(vehicle)?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read replay file {:?}", file))?;

    let mut learner = app.learner(vehicle);
    let mut last_seen = None;
    let mut samples = 0;
    let mut skipped = 0;
    let mut imported = 0;

    for entry in parse_replay(&content) {
        let sample = match entry {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "Skipping replay entry");
                skipped += 1;
                continue;
            }
        };

        let now = sample.timestamp.unwrap_or_else(chargecurve_util::now);
        let events = learner.record(&sample, now);
        imported += count_finalized(&events);
        samples += 1;
        last_seen = Some(now);
    }

    if let Some(end) = last_seen {
        imported += count_finalized(&learner.finalize_session(end));
    }

    info!(
        vehicle = %vehicle.id,
        samples,
        skipped,
        imported,
        "Replay complete"
    );

    println!("{}", serde_json::to_string_pretty(&learner.learning_stats())?);
    Ok(())
}

fn count_finalized(events: &[CoreEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, CoreEvent::SessionFinalized { .. }))
        .count()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "chargecurved starting"
    );

    if is_mock_time_active() {
        warn!("Mock time is active, timestamps are not wall-clock time");
    }

    let app = App::load(&args)?;

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => run(app).await,
        Commands::Predict {
            vehicle,
            soc,
            target,
            power,
        } => predict(&app, &vehicle, soc, target, power),
        Commands::Stats { vehicle } => stats(&app, vehicle.as_deref()),
        Commands::Replay { vehicle, file } => replay(&app, &vehicle, &file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargecurve_config::parse_config;

    fn app(data_dir: &Path) -> App {
        let config = parse_config(
            r#"
            config_version = 1

            [[vehicles]]
            id = "ix3"

            [[vehicles]]
            id = "zoe"
            battery_capacity_kwh = 52.0
            "#,
        )
        .unwrap();

        App {
            config,
            data_dir: data_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_vehicle_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let zoe = app.vehicle("zoe").unwrap();
        assert_eq!(zoe.id.as_str(), "zoe");
        assert_eq!(zoe.profile.battery_capacity_kwh, 52.0);

        let err = app.vehicle("model3").unwrap_err();
        assert!(err.to_string().contains("Unknown vehicle 'model3'"));
    }
}
