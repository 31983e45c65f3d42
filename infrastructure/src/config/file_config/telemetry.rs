//! Telemetry configuration from TOML (`[telemetry]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw telemetry configuration from TOML
///
/// When enabled, every agent step and background task appends one JSON line
/// to `path`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTelemetryConfig {
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

impl FileTelemetryConfig {
    /// Target file when enabled; `<data_dir>/agent-dispatch/performance.jsonl`
    /// unless `path` is set.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        Some(self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("agent-dispatch"))
                .unwrap_or_else(|| PathBuf::from(".agent-dispatch"))
                .join("performance.jsonl")
        }))
    }
}
