//! Cross-process exclusion for the JSON task store.
//!
//! Two kinds of marker live next to the snapshot:
//!
//! - `<snapshot>.lock` is created with `create_new` for the length of one
//!   read-modify-write and removed by [`StoreLock`]'s `Drop`.
//! - `<snapshot>.holders/<holder>.json` is a [`HolderLease`], one per open
//!   store handle, refreshed on every locked operation. A running task
//!   whose claimant has no fresh lease belongs to a dead process.

use chrono::{DateTime, Utc};
use dispatch_domain::RepositoryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);
const LEASE_EXTENSION: &str = "json";

/// Contents of a lock or lease file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerMetadata {
    pub holder: String,
    pub pid: u32,
    pub updated_at: DateTime<Utc>,
}

impl MarkerMetadata {
    pub fn new(holder: &str) -> Self {
        Self {
            holder: holder.to_string(),
            pid: std::process::id(),
            updated_at: Utc::now(),
        }
    }

    fn to_json(&self) -> Result<Vec<u8>, RepositoryError> {
        serde_json::to_vec_pretty(self).map_err(|e| RepositoryError::Encoding(e.to_string()))
    }
}

/// How long ago the marker at `path` was written.
///
/// Falls back to the file's mtime when the contents are unreadable, e.g. a
/// lock whose creator has not finished writing it.
async fn marker_age(path: &Path) -> std::io::Result<Duration> {
    let bytes = tokio::fs::read(path).await?;
    if let Ok(meta) = serde_json::from_slice::<MarkerMetadata>(&bytes) {
        return Ok((Utc::now() - meta.updated_at).to_std().unwrap_or_default());
    }
    let modified = tokio::fs::metadata(path).await?.modified()?;
    Ok(SystemTime::now().duration_since(modified).unwrap_or_default())
}

fn io_error(path: &Path, e: std::io::Error) -> RepositoryError {
    RepositoryError::Io(format!("{}: {}", path.display(), e))
}

/// Exclusive hold on the store; released on drop.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    released: bool,
}

impl StoreLock {
    /// Create the lock file, waiting up to `timeout` for another holder.
    ///
    /// A lock older than `stale_after` is assumed abandoned and removed.
    pub async fn acquire(
        path: &Path,
        holder: &str,
        timeout: Duration,
        stale_after: Duration,
    ) -> Result<Self, RepositoryError> {
        let deadline = Instant::now() + timeout;
        let contents = MarkerMetadata::new(holder).to_json()?;

        loop {
            match Self::try_create(path, &contents).await {
                Ok(()) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(io_error(path, e)),
            }

            match marker_age(path).await {
                Ok(age) if age > stale_after => {
                    warn!(
                        "Removing stale store lock {} ({}s old)",
                        path.display(),
                        age.as_secs()
                    );
                    match tokio::fs::remove_file(path).await {
                        Ok(()) => continue,
                        Err(e) if e.kind() == ErrorKind::NotFound => continue,
                        Err(e) => return Err(io_error(path, e)),
                    }
                }
                // Released between our attempt and the read.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                _ => {}
            }

            if Instant::now() >= deadline {
                return Err(RepositoryError::Locked(format!(
                    "{} is held by another process",
                    path.display()
                )));
            }
            tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
        }
    }

    async fn try_create(path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;

        let written = async {
            file.write_all(contents).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(path).await;
            return Err(e);
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file now, reporting failure instead of logging it.
    pub fn release(mut self) -> Result<(), RepositoryError> {
        self.released = true;
        std::fs::remove_file(&self.path).map_err(|e| io_error(&self.path, e))
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            warn!("Failed to release store lock {}: {}", self.path.display(), e);
        }
    }
}

/// Marks one open store handle as alive; removed on drop.
#[derive(Debug)]
pub struct HolderLease {
    holder: String,
    path: PathBuf,
}

impl HolderLease {
    pub async fn register(dir: &Path, holder: &str) -> Result<Self, RepositoryError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| io_error(dir, e))?;
        let lease = Self {
            holder: holder.to_string(),
            path: dir.join(format!("{}.{}", holder, LEASE_EXTENSION)),
        };
        lease.refresh().await?;
        Ok(lease)
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Rewrite the lease with the current time.
    pub async fn refresh(&self) -> Result<(), RepositoryError> {
        let contents = MarkerMetadata::new(&self.holder).to_json()?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &contents)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))
    }
}

impl Drop for HolderLease {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            warn!("Failed to remove holder lease {}: {}", self.path.display(), e);
        }
    }
}

/// Holders whose lease in `dir` was refreshed within `ttl`.
///
/// Expired leases are deleted as they are found.
pub async fn live_holders(
    dir: &Path,
    ttl: Duration,
) -> Result<BTreeSet<String>, RepositoryError> {
    let mut live = BTreeSet::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(live),
        Err(e) => return Err(io_error(dir, e)),
    };

    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, e))? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(LEASE_EXTENSION) {
            continue;
        }
        let Some(holder) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match marker_age(&path).await {
            Ok(age) if age <= ttl => {
                live.insert(holder.to_string());
            }
            Ok(age) => {
                debug!("Expiring lease {} ({}s old)", path.display(), age.as_secs());
                if let Err(e) = tokio::fs::remove_file(&path).await
                    && e.kind() != ErrorKind::NotFound
                {
                    return Err(io_error(&path, e));
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&path, e)),
        }
    }
    Ok(live)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn acquire(
        path: &Path,
        holder: &str,
        timeout_ms: u64,
    ) -> Result<StoreLock, RepositoryError> {
        StoreLock::acquire(
            path,
            holder,
            Duration::from_millis(timeout_ms),
            Duration::from_secs(30),
        )
        .await
    }

    #[tokio::test]
    async fn test_second_acquire_times_out_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json.lock");

        let held = acquire(&path, "a", 1000).await.unwrap();
        let err = acquire(&path, "b", 50).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Locked(_)));

        held.release().unwrap();
        assert!(!path.exists());
        acquire(&path, "b", 50).await.unwrap();
    }

    #[tokio::test]
    async fn test_drop_removes_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json.lock");
        {
            let lock = acquire(&path, "a", 1000).await.unwrap();
            assert_eq!(lock.path(), path.as_path());
            let meta: MarkerMetadata =
                serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
            assert_eq!(meta.holder, "a");
            assert_eq!(meta.pid, std::process::id());
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_stale_lock_is_broken() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json.lock");
        let abandoned = MarkerMetadata {
            holder: "crashed".to_string(),
            pid: 1,
            updated_at: Utc::now() - chrono::Duration::minutes(5),
        };
        std::fs::write(&path, serde_json::to_vec(&abandoned).unwrap()).unwrap();

        acquire(&path, "b", 200).await.unwrap();
    }

    #[tokio::test]
    async fn test_leases_expire() {
        let dir = tempfile::tempdir().unwrap();
        let holders = dir.path().join("tasks.json.holders");

        let fresh = HolderLease::register(&holders, "fresh").await.unwrap();
        let expired = MarkerMetadata {
            holder: "gone".to_string(),
            pid: 1,
            updated_at: Utc::now() - chrono::Duration::hours(1),
        };
        std::fs::write(
            holders.join("gone.json"),
            serde_json::to_vec(&expired).unwrap(),
        )
        .unwrap();

        let live = live_holders(&holders, Duration::from_secs(60)).await.unwrap();
        assert_eq!(live.len(), 1);
        assert!(live.contains(fresh.holder()));
        assert!(!holders.join("gone.json").exists());

        drop(fresh);
        assert!(live_holders(&holders, Duration::from_secs(60)).await.unwrap().is_empty());
    }
}
