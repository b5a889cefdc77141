//! In-memory store implementation

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{HistoryStore, SessionHistory, StoreResult};

/// Keeps the serialized snapshot in memory (for testing and dry runs).
///
/// Snapshots go through the same JSON encoding as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Option<String>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw snapshot text, which need not be valid
    pub fn with_snapshot(snapshot: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                snapshot: Some(snapshot.into()),
                saves: 0,
            }),
        }
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.state().saves
    }

    /// Current snapshot text, if any
    pub fn snapshot(&self) -> Option<String> {
        self.state().snapshot.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistoryStore for MemoryStore {
    fn load_history(&self) -> StoreResult<Option<SessionHistory>> {
        match &self.state().snapshot {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save_history(&self, history: &SessionHistory) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(history)?;
        let mut state = self.state();
        state.snapshot = Some(json);
        state.saves += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_no_history() {
        let store = MemoryStore::new();
        assert!(store.load_history().unwrap().is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn saves_are_counted() {
        let store = MemoryStore::new();
        store.save_history(&SessionHistory::new()).unwrap();
        store.save_history(&SessionHistory::new()).unwrap();

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.snapshot().as_deref(), Some("{}"));
        assert_eq!(store.load_history().unwrap(), Some(SessionHistory::new()));
    }

    #[test]
    fn invalid_snapshot_fails_to_load() {
        let store = MemoryStore::with_snapshot("[1, 2, 3]");
        assert!(store.load_history().is_err());
    }
}
