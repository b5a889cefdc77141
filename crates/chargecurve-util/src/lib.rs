//! Shared utilities for chargecurve
//!
//! This crate provides:
//! - Vehicle identifiers
//! - Clock access (with mock time in debug builds) and timestamp helpers
//! - Default paths for config and data directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
