//! In-memory task repository.

use super::table::TaskTable;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatch_domain::{
    AgentId, BackgroundTask, QueueOverview, RepositoryError, TaskId, TaskRepository, TaskStats,
    TaskStatus,
};
use tokio::sync::Mutex;

/// Volatile [`TaskRepository`]; all operations run under one lock.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    table: Mutex<TaskTable>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: BackgroundTask) -> Result<(), RepositoryError> {
        self.table.lock().await.insert(task)
    }

    async fn get(&self, id: &TaskId) -> Result<Option<BackgroundTask>, RepositoryError> {
        Ok(self.table.lock().await.get(id).cloned())
    }

    async fn claim_next(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<BackgroundTask>, RepositoryError> {
        Ok(self.table.lock().await.claim_next(now))
    }

    async fn compare_and_swap(
        &self,
        task: &BackgroundTask,
        expected: TaskStatus,
    ) -> Result<bool, RepositoryError> {
        self.table.lock().await.compare_and_swap(task, expected)
    }

    async fn list(
        &self,
        status: Option<TaskStatus>,
    ) -> Result<Vec<BackgroundTask>, RepositoryError> {
        Ok(self.table.lock().await.list(status))
    }

    async fn next_due(&self) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        Ok(self.table.lock().await.next_due())
    }

    async fn stats(&self, agent_id: Option<&AgentId>) -> Result<TaskStats, RepositoryError> {
        Ok(self.table.lock().await.stats(agent_id))
    }

    async fn overview(&self) -> Result<QueueOverview, RepositoryError> {
        Ok(self.table.lock().await.overview())
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> Result<usize, RepositoryError> {
        Ok(self.table.lock().await.purge_finished(before))
    }
}
