//! Persistence layer for chargecurve
//!
//! Provides:
//! - Session history (finalized sessions per key, bounded retention)
//! - Store trait for loading/saving a whole history snapshot
//! - JSON file backend (one file per vehicle) and an in-memory backend

mod history;
mod json;
mod memory;
mod traits;

pub use history::*;
pub use json::*;
pub use memory::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
