//! Store trait definitions

use crate::{SessionHistory, StoreResult};

/// Persistence backend for one vehicle's session history.
///
/// A save replaces the whole snapshot; there is no incremental append.
pub trait HistoryStore: Send + Sync {
    /// Load the last saved history.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet, and an error when
    /// a snapshot exists but cannot be read or parsed.
    fn load_history(&self) -> StoreResult<Option<SessionHistory>>;

    /// Replace the saved history with `history`
    fn save_history(&self, history: &SessionHistory) -> StoreResult<()>;

    /// Human-readable location, for logs
    fn location(&self) -> String;
}
