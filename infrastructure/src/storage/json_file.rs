//! JSON snapshot task repository.
//!
//! Several processes may open the same snapshot. Every operation re-reads
//! it from disk; mutations run under the store lock and rewrite the whole
//! table: serialized to a sibling temp file, then renamed over the
//! snapshot. A mutation whose write fails leaves the file unchanged.

use super::lock::{HolderLease, StoreLock, live_holders};
use super::table::{SNAPSHOT_VERSION, TaskTable};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatch_domain::{
    AgentId, BackgroundTask, QueueOverview, RepositoryError, TaskId, TaskRepository, TaskStats,
    TaskStatus,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Locking and liveness settings for [`JsonFileTaskRepository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStoreOptions {
    /// How long an operation waits for another process's lock.
    pub lock_timeout: Duration,
    /// Age after which a lock is treated as abandoned.
    pub stale_lock_after: Duration,
    /// Age after which a silent handle's running tasks are requeued.
    /// Must exceed the longest task run.
    pub lease_ttl: Duration,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(10),
            stale_lock_after: Duration::from_secs(30),
            lease_ttl: Duration::from_secs(600),
        }
    }
}

impl FileStoreOptions {
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_lease_ttl(mut self, ttl: Duration) -> Self {
        self.lease_ttl = ttl;
        self
    }
}

/// Durable [`TaskRepository`] backed by one JSON file.
#[derive(Debug)]
pub struct JsonFileTaskRepository {
    path: PathBuf,
    lock_path: PathBuf,
    holders_dir: PathBuf,
    lease: HolderLease,
    options: FileStoreOptions,
    /// Serializes this handle's own operations before the file lock.
    local: Mutex<()>,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("tasks.json"));
    name.push(suffix);
    path.with_file_name(name)
}

impl JsonFileTaskRepository {
    /// Open (or create) the snapshot at `path` with default options.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        Self::open_with(path, FileStoreOptions::default()).await
    }

    /// Open (or create) the snapshot at `path`.
    ///
    /// Running tasks whose claiming handle is gone (closed, or silent for
    /// longer than `lease_ttl`) are returned to `pending` without consuming
    /// a retry. Tasks claimed by a live handle are left alone.
    pub async fn open_with(
        path: impl AsRef<Path>,
        options: FileStoreOptions,
    ) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Io(format!("{}: {}", parent.display(), e)))?;
        }

        let holder = format!("{}-{}", std::process::id(), uuid::Uuid::new_v4().simple());
        let lock_path = sibling(&path, ".lock");
        let holders_dir = sibling(&path, ".holders");

        let lock = StoreLock::acquire(
            &lock_path,
            &holder,
            options.lock_timeout,
            options.stale_lock_after,
        )
        .await?;
        let mut table = load_snapshot(&path).await?;
        let live = live_holders(&holders_dir, options.lease_ttl).await?;
        let requeued = table.requeue_orphaned(&live);
        if requeued > 0 {
            warn!(
                "Requeued {} task(s) whose worker went away ({})",
                requeued,
                path.display()
            );
            write_snapshot(&path, &table).await?;
        }
        let lease = HolderLease::register(&holders_dir, &holder).await?;
        lock.release()?;

        info!(
            "Opened task store {} ({} task(s), {} other handle(s))",
            path.display(),
            table.len(),
            live.len()
        );
        Ok(Self {
            path,
            lock_path,
            holders_dir,
            lease,
            options,
            local: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier this handle records against the tasks it claims.
    pub fn holder(&self) -> &str {
        self.lease.holder()
    }

    /// Read the snapshot as currently on disk.
    async fn read(&self) -> Result<TaskTable, RepositoryError> {
        load_snapshot(&self.path).await
    }

    /// Apply `mutate` to the on-disk table under the store lock, writing it
    /// back when it reports a change.
    ///
    /// With `recover`, running tasks of dead handles are requeued first.
    async fn mutate<T>(
        &self,
        recover: bool,
        mutate: impl FnOnce(&mut TaskTable) -> Result<(T, bool), RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let _local = self.local.lock().await;
        let lock = StoreLock::acquire(
            &self.lock_path,
            self.holder(),
            self.options.lock_timeout,
            self.options.stale_lock_after,
        )
        .await?;
        self.lease.refresh().await?;

        let mut table = load_snapshot(&self.path).await?;
        let mut changed = false;
        if recover {
            let live = live_holders(&self.holders_dir, self.options.lease_ttl).await?;
            let requeued = table.requeue_orphaned(&live);
            if requeued > 0 {
                warn!("Requeued {} task(s) whose worker went away", requeued);
                changed = true;
            }
        }

        let (value, mutated) = mutate(&mut table)?;
        if changed || mutated {
            write_snapshot(&self.path, &table).await?;
        }
        lock.release()?;
        Ok(value)
    }
}

async fn load_snapshot(path: &Path) -> Result<TaskTable, RepositoryError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let table: TaskTable = serde_json::from_slice(&bytes)
                .map_err(|e| RepositoryError::Encoding(format!("{}: {}", path.display(), e)))?;
            if table.version() > SNAPSHOT_VERSION {
                return Err(RepositoryError::Encoding(format!(
                    "{}: unsupported snapshot version {}",
                    path.display(),
                    table.version()
                )));
            }
            Ok(table)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TaskTable::new()),
        Err(e) => Err(RepositoryError::Io(format!("{}: {}", path.display(), e))),
    }
}

async fn write_snapshot(path: &Path, table: &TaskTable) -> Result<(), RepositoryError> {
    let bytes =
        serde_json::to_vec_pretty(table).map_err(|e| RepositoryError::Encoding(e.to_string()))?;
    let io_err = |e: std::io::Error| RepositoryError::Io(format!("{}: {}", path.display(), e));

    let tmp = sibling(path, ".tmp");
    tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    debug!("Wrote task snapshot {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[async_trait]
impl TaskRepository for JsonFileTaskRepository {
    async fn insert(&self, task: BackgroundTask) -> Result<(), RepositoryError> {
        self.mutate(false, |table| table.insert(task).map(|()| ((), true)))
            .await
    }

    async fn get(&self, id: &TaskId) -> Result<Option<BackgroundTask>, RepositoryError> {
        Ok(self.read().await?.get(id).cloned())
    }

    async fn claim_next(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<BackgroundTask>, RepositoryError> {
        let holder = self.holder().to_string();
        self.mutate(true, |table| {
            let claimed = table.claim_next(now);
            if let Some(task) = &claimed {
                table.record_claim(&task.id, &holder);
            }
            let changed = claimed.is_some();
            Ok((claimed, changed))
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        task: &BackgroundTask,
        expected: TaskStatus,
    ) -> Result<bool, RepositoryError> {
        self.mutate(false, |table| {
            let swapped = table.compare_and_swap(task, expected)?;
            Ok((swapped, swapped))
        })
        .await
    }

    async fn list(
        &self,
        status: Option<TaskStatus>,
    ) -> Result<Vec<BackgroundTask>, RepositoryError> {
        Ok(self.read().await?.list(status))
    }

    async fn next_due(&self) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        Ok(self.read().await?.next_due())
    }

    async fn stats(&self, agent_id: Option<&AgentId>) -> Result<TaskStats, RepositoryError> {
        Ok(self.read().await?.stats(agent_id))
    }

    async fn overview(&self) -> Result<QueueOverview, RepositoryError> {
        Ok(self.read().await?.overview())
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> Result<usize, RepositoryError> {
        self.mutate(false, |table| {
            let purged = table.purge_finished(before);
            Ok((purged, purged > 0))
        })
        .await
    }
}
