//! JSON file store implementation

use chargecurve_util::{VehicleId, history_file_path};
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{HistoryStore, SessionHistory, StoreResult};

/// Stores a history as one pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `vehicle_id` inside `data_dir` (`charge_history_<id>.json`)
    pub fn for_vehicle(data_dir: &Path, vehicle_id: &VehicleId) -> Self {
        Self::new(history_file_path(data_dir, vehicle_id))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write `json` beside the target, flush it to disk and rename it over the target
    fn replace_with(&self, json: &str) -> std::io::Result<()> {
        let temp = self.temp_path();
        let result = File::create(&temp)
            .and_then(|mut file| {
                file.write_all(json.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| std::fs::rename(&temp, &self.path));

        if result.is_err() {
            let _ = std::fs::remove_file(&temp);
        }
        result
    }
}

impl HistoryStore for JsonFileStore {
    fn load_history(&self) -> StoreResult<Option<SessionHistory>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No history file yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let history: SessionHistory = serde_json::from_str(&content)?;
        debug!(
            path = %self.path.display(),
            sessions = history.total_sessions(),
            "History file read"
        );
        Ok(Some(history))
    }

    fn save_history(&self, history: &SessionHistory) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(history)?;

        self.replace_with(&json)?;

        debug!(
            path = %self.path.display(),
            sessions = history.total_sessions(),
            "History file written"
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
