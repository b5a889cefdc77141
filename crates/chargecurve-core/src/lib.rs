//! Charge curve learning for chargecurve
//!
//! This crate is the heart of chargecurve, containing:
//! - Session recording (open -> extend -> finalize) keyed by charger category and target SoC
//! - Throttled persistence of the session history
//! - Charge time prediction from historical curves (inverse-distance weighted)
//! - Theoretical charge time estimates as a fallback

mod engine;
mod estimate;
mod events;
mod predictor;
mod session;

pub use engine::*;
pub use estimate::*;
pub use events::*;
pub use predictor::*;
pub use session::*;
