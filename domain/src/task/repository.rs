//! Background task repository trait

use super::entities::{BackgroundTask, TaskStatus};
use super::stats::{QueueOverview, TaskStats};
use super::value_objects::{AgentId, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by task storage
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Task already exists: {0}")]
    Duplicate(TaskId),

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Storage encoding error: {0}")]
    Encoding(String),

    #[error("Task store is locked: {0}")]
    Locked(String),
}

/// Repository trait for background tasks
///
/// This is a domain-level abstraction over durable task storage.
/// Implementations live in the infrastructure layer; the scheduler owns all
/// lifecycle decisions and only uses the repository to store and claim.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task
    async fn insert(&self, task: BackgroundTask) -> Result<(), RepositoryError>;

    /// Read a task by id
    async fn get(&self, id: &TaskId) -> Result<Option<BackgroundTask>, RepositoryError>;

    /// Atomically claim the next eligible task.
    ///
    /// Among `pending` tasks with `scheduled_for <= now`, selects the lowest
    /// `priority`, then the earliest `created_at`, then insertion order, and
    /// transitions it to `running` with `started_at = now` before returning
    /// it. Two concurrent callers never receive the same task.
    async fn claim_next(&self, now: DateTime<Utc>)
    -> Result<Option<BackgroundTask>, RepositoryError>;

    /// Replace the stored task only if its stored status is still `expected`.
    ///
    /// Returns `false` when the status no longer matches (another caller won).
    async fn compare_and_swap(
        &self,
        task: &BackgroundTask,
        expected: TaskStatus,
    ) -> Result<bool, RepositoryError>;

    /// All tasks, optionally filtered by status, in claim order
    async fn list(&self, status: Option<TaskStatus>)
    -> Result<Vec<BackgroundTask>, RepositoryError>;

    /// Earliest `scheduled_for` among pending tasks
    async fn next_due(&self) -> Result<Option<DateTime<Utc>>, RepositoryError>;

    /// Outcome aggregates over finished tasks
    async fn stats(&self, agent_id: Option<&AgentId>) -> Result<TaskStats, RepositoryError>;

    /// Task counts per status
    async fn overview(&self) -> Result<QueueOverview, RepositoryError>;

    /// Delete `completed` and `failed` tasks that finished before `before`.
    ///
    /// Pending and running tasks are never removed. Returns how many tasks
    /// were deleted.
    async fn purge_finished(&self, before: DateTime<Utc>) -> Result<usize, RepositoryError>;
}
