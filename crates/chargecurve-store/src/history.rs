//! Finalized charging sessions, partitioned by session key

use chargecurve_api::{ChargingSession, KeyStats, LearningStats, SessionKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Default number of sessions kept per key
pub const DEFAULT_MAX_SESSIONS_PER_KEY: usize = 50;

/// Archive of finalized sessions, oldest first within each key.
///
/// Serializes as a JSON object mapping `"<category>_<target>"` to an array of
/// sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHistory {
    sessions: BTreeMap<SessionKey, VecDeque<ChargingSession>>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a session under its own key, evicting the oldest sessions of
    /// that key beyond `max_per_key`. Returns how many were evicted.
    pub fn push(&mut self, session: ChargingSession, max_per_key: usize) -> usize {
        let key = session.session_key;
        let bucket = self.sessions.entry(key).or_default();
        bucket.push_back(session);

        let evicted = truncate_oldest(bucket, max_per_key);
        if evicted > 0 {
            debug!(session_key = %key, evicted, "Oldest sessions evicted");
        }
        evicted
    }

    /// Apply the retention limit to every key, e.g. after loading a file
    /// written with a larger limit. Returns how many sessions were evicted.
    pub fn enforce_limit(&mut self, max_per_key: usize) -> usize {
        self.sessions
            .values_mut()
            .map(|bucket| truncate_oldest(bucket, max_per_key))
            .sum()
    }

    /// Sessions recorded under `key`, oldest first
    pub fn sessions(&self, key: &SessionKey) -> impl Iterator<Item = &ChargingSession> {
        self.sessions.get(key).into_iter().flatten()
    }

    pub fn session_count(&self, key: &SessionKey) -> usize {
        self.sessions.get(key).map_or(0, VecDeque::len)
    }

    pub fn total_sessions(&self) -> usize {
        self.sessions.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_sessions() == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = &SessionKey> {
        self.sessions.keys()
    }

    /// Count and most recent end time per key
    pub fn stats(&self) -> LearningStats {
        let categories = self
            .sessions
            .iter()
            .filter_map(|(key, bucket)| {
                let latest = bucket.back()?;
                Some((
                    *key,
                    KeyStats {
                        count: bucket.len(),
                        latest: latest.end_time,
                    },
                ))
            })
            .collect();

        LearningStats {
            total_sessions: self.total_sessions(),
            categories,
        }
    }
}

fn truncate_oldest(bucket: &mut VecDeque<ChargingSession>, max_len: usize) -> usize {
    let excess = bucket.len().saturating_sub(max_len);
    bucket.drain(..excess);
    excess
}
