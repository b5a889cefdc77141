//! Telemetry input: live snapshot files and JSON Lines replay files

use chargecurve_api::{Telemetry, TelemetryError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read telemetry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed telemetry: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid telemetry: {0}")]
    Invalid(#[from] TelemetryError),

    #[error("Line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<SourceError>,
    },
}

/// Parse and validate one telemetry snapshot
pub fn parse_snapshot(content: &str) -> Result<Telemetry, SourceError> {
    let sample: Telemetry = serde_json::from_str(content)?;
    sample.validate()?;
    Ok(sample)
}

/// Read the snapshot a vehicle integration keeps at `path`
pub async fn read_snapshot(path: &Path) -> Result<Telemetry, SourceError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_snapshot(&content)
}

/// Parse a replay file: one telemetry object per line, blank lines ignored.
///
/// Each entry is either a sample or the error for that line, so a replay can
/// skip bad lines and keep going.
pub fn parse_replay(content: &str) -> Vec<Result<Telemetry, SourceError>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_snapshot(line).map_err(|e| SourceError::Line {
                line: index + 1,
                source: Box::new(e),
            })
        })
        .collect()
}
