//! JSONL file writer for agent performance records.
//!
//! Each [`PerformanceRecord`] becomes one JSON line with a `timestamp` field,
//! appended through a buffered writer.

use dispatch_application::ports::performance_sink::{PerformanceRecord, PerformanceSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Performance sink that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlPerformanceSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlPerformanceSink {
    /// Open the given path for appending.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create telemetry directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open telemetry file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PerformanceSink for JsonlPerformanceSink {
    fn record(&self, record: PerformanceRecord) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let Ok(serde_json::Value::Object(mut map)) = serde_json::to_value(&record) else {
            return;
        };
        map.insert(
            "timestamp".to_string(),
            serde_json::Value::String(timestamp),
        );

        let Ok(line) = serde_json::to_string(&map) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlPerformanceSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf").join("agents.jsonl");
        let sink = JsonlPerformanceSink::new(&path).unwrap();

        sink.record(
            PerformanceRecord::new("shopping", "primary", 120, true).with_quality(Some(0.75)),
        );
        sink.record(PerformanceRecord::new("system", "data_maintenance", 5, false));
        drop(sink);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["agent_id"], "shopping");
        assert_eq!(lines[0]["duration_ms"], 120);
        assert_eq!(lines[0]["quality_score"], 0.75);
        assert!(lines[0].get("timestamp").is_some());
        assert_eq!(lines[1]["success"], false);
        assert!(lines[1]["quality_score"].is_null());
    }

    #[test]
    fn test_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.jsonl");

        for _ in 0..2 {
            let sink = JsonlPerformanceSink::new(&path).unwrap();
            sink.record(PerformanceRecord::new("research", "primary", 1, true));
        }

        assert_eq!(read_lines(&path).len(), 2);
    }
}
