//! Shared data model for chargecurve
//!
//! This crate defines the types exchanged between the recorder, the store,
//! the predictor and the daemon:
//! - Charger categories and session keys
//! - Charging sessions and their data points
//! - Telemetry samples and their validation
//! - Learning statistics

mod session;
mod telemetry;
mod types;

pub use session::*;
pub use telemetry::*;
pub use types::*;
