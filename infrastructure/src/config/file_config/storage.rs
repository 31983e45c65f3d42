//! Storage configuration from TOML (`[storage]` section)

use crate::storage::FileStoreOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where background tasks are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Lost on exit
    Memory,
    /// JSON snapshot at `storage.path`
    #[default]
    File,
}

/// Raw storage configuration from TOML
///
/// # Example
///
/// ```toml
/// [storage]
/// backend = "file"
/// path = "/var/lib/agent-dispatch/tasks.json"
/// lock_timeout_ms = 10000
/// lease_ttl_secs = 600    # must exceed scheduler.task_timeout_secs
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub backend: StorageBackend,
    /// Snapshot path for the file backend; defaults to the data directory
    pub path: Option<PathBuf>,
    /// Wait for another process's store lock before giving up
    pub lock_timeout_ms: u64,
    /// Running tasks of a handle silent this long are requeued
    pub lease_ttl_secs: u64,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        let options = FileStoreOptions::default();
        Self {
            backend: StorageBackend::File,
            path: None,
            lock_timeout_ms: options.lock_timeout.as_millis() as u64,
            lease_ttl_secs: options.lease_ttl.as_secs(),
        }
    }
}

impl FileStorageConfig {
    /// `storage.path`, else `<data_dir>/agent-dispatch/tasks.json`,
    /// else `./.agent-dispatch/tasks.json`.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("agent-dispatch"))
                .unwrap_or_else(|| PathBuf::from(".agent-dispatch"))
                .join("tasks.json")
        })
    }

    pub fn to_store_options(&self) -> FileStoreOptions {
        FileStoreOptions::default()
            .with_lock_timeout(Duration::from_millis(self.lock_timeout_ms))
            .with_lease_ttl(Duration::from_secs(self.lease_ttl_secs))
    }
}
