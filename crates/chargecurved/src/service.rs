//! Polling service: feeds live telemetry into one learner per vehicle

use anyhow::{Context, Result};
use chargecurve_config::{DaemonConfig, Vehicle};
use chargecurve_core::{ChargeLearner, CoreEvent};
use chargecurve_util::format_clock_time;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};

use crate::source::read_snapshot;

/// A vehicle with a telemetry source and its learner
struct Monitored {
    telemetry_path: PathBuf,
    learner: ChargeLearner,
}

pub struct Service {
    vehicles: Vec<Monitored>,
    idle_poll: Duration,
    charging_poll: Duration,
}

impl Service {
    pub fn new(daemon: &DaemonConfig, learners: Vec<(Vehicle, ChargeLearner)>) -> Result<Self> {
        let mut vehicles = Vec::new();
        for (vehicle, learner) in learners {
            match vehicle.telemetry_path {
                Some(telemetry_path) => {
                    info!(
                        vehicle = %vehicle.id,
                        label = %vehicle.label,
                        telemetry = %telemetry_path.display(),
                        "Monitoring vehicle"
                    );
                    vehicles.push(Monitored {
                        telemetry_path,
                        learner,
                    });
                }
                None => warn!(vehicle = %vehicle.id, "No telemetry_path configured, not monitoring"),
            }
        }

        anyhow::ensure!(
            !vehicles.is_empty(),
            "No vehicle has a telemetry_path configured"
        );

        Ok(Self {
            vehicles,
            idle_poll: daemon.idle_poll,
            charging_poll: daemon.charging_poll,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        info!(
            vehicles = self.vehicles.len(),
            idle_poll_secs = self.idle_poll.as_secs(),
            charging_poll_secs = self.charging_poll.as_secs(),
            "Service running"
        );

        let mut delay = self.tick().await;

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    delay = self.tick().await;
                }
            }
        }

        for monitored in &self.vehicles {
            if let Some(session) = monitored.learner.current_session() {
                info!(
                    vehicle = %monitored.learner.vehicle_id(),
                    key = %session.session_key,
                    data_points = session.data_points.len(),
                    "Open charging session is not finalized at shutdown"
                );
            }
        }

        info!("Shutdown complete");
        Ok(())
    }

    /// Poll every vehicle once; returns the delay until the next poll
    async fn tick(&mut self) -> Duration {
        let now = chargecurve_util::now();
        let mut any_charging = false;

        for monitored in &mut self.vehicles {
            let sample = match read_snapshot(&monitored.telemetry_path).await {
                Ok(sample) => sample,
                Err(e) => {
                    warn!(
                        vehicle = %monitored.learner.vehicle_id(),
                        path = %monitored.telemetry_path.display(),
                        error = %e,
                        "Skipping telemetry"
                    );
                    any_charging |= monitored.learner.is_charging();
                    continue;
                }
            };

            for event in monitored.learner.record(&sample, now) {
                handle_core_event(&monitored.learner, event, now);
            }

            if sample.is_charging() {
                any_charging = true;
                log_estimate(&monitored.learner, sample.soc, sample.target_soc, sample.power_kw, now);
            }
        }

        if any_charging {
            self.charging_poll
        } else {
            self.idle_poll
        }
    }
}

fn handle_core_event(learner: &ChargeLearner, event: CoreEvent, now: DateTime<Local>) {
    match event {
        CoreEvent::SessionStarted {
            start_soc,
            power_kw,
            ..
        } => {
            debug!(
                vehicle = %learner.vehicle_id(),
                start_soc,
                power_kw,
                "Session start acknowledged"
            );
        }
        CoreEvent::SessionFinalized {
            session_key,
            evicted,
            ..
        } => {
            if evicted > 0 {
                debug!(
                    vehicle = %learner.vehicle_id(),
                    key = %session_key,
                    evicted,
                    "Oldest sessions dropped"
                );
            }
            debug!(
                vehicle = %learner.vehicle_id(),
                sessions = learner.history().session_count(&session_key),
                at = %format_clock_time(&now),
                "Session added to history"
            );
        }
        CoreEvent::HistorySaved { total_sessions, .. } => {
            debug!(vehicle = %learner.vehicle_id(), total_sessions, "History persisted");
        }
        CoreEvent::HistorySaveFailed { error, .. } => {
            warn!(
                vehicle = %learner.vehicle_id(),
                error = %error,
                "History not persisted, will retry on the next save"
            );
        }
    }
}

fn log_estimate(learner: &ChargeLearner, soc: f64, target_soc: f64, power_kw: f64, now: DateTime<Local>) {
    match learner.estimate(soc, target_soc, power_kw, now) {
        Some(estimate) => info!(
            vehicle = %learner.vehicle_id(),
            soc,
            target_soc,
            minutes = estimate.minutes.round(),
            source = ?estimate.source,
            completes_at = estimate
                .completes_at
                .as_ref()
                .map(format_clock_time)
                .as_deref()
                .unwrap_or("unknown"),
            "Charge estimate"
        ),
        None => debug!(vehicle = %learner.vehicle_id(), "No charge estimate available"),
    }
}
