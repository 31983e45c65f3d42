//! Shared mocks for use case tests.

use crate::ports::agent_executor::ExecutorError;
use crate::ports::performance_sink::{PerformanceRecord, PerformanceSink};
use crate::ports::task_executor::{TaskExecutor, TaskOutput};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dispatch_domain::{
    AgentId, BackgroundTask, QueueOverview, RepositoryError, TaskId, TaskRepository, TaskStats,
    TaskStatus,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

/// Vec-backed repository; insertion order doubles as the final tie-break.
#[derive(Default)]
pub struct MockRepository {
    tasks: Mutex<Vec<BackgroundTask>>,
}

#[async_trait]
impl TaskRepository for MockRepository {
    async fn insert(&self, task: BackgroundTask) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(RepositoryError::Duplicate(task.id));
        }
        tasks.push(task);
        Ok(())
    }

    async fn get(&self, id: &TaskId) -> Result<Option<BackgroundTask>, RepositoryError> {
        Ok(self.tasks.lock().unwrap().iter().find(|t| &t.id == id).cloned())
    }

    async fn claim_next(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<BackgroundTask>, RepositoryError> {
        let mut tasks = self.tasks.lock().unwrap();
        let next = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_eligible(now))
            .min_by_key(|(i, t)| (t.priority, t.created_at, *i))
            .map(|(i, _)| i);
        let Some(index) = next else {
            return Ok(None);
        };
        let task = &mut tasks[index];
        task.start(now).unwrap();
        Ok(Some(task.clone()))
    }

    async fn compare_and_swap(
        &self,
        task: &BackgroundTask,
        expected: TaskStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tasks = self.tasks.lock().unwrap();
        let stored = tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| RepositoryError::NotFound(task.id.clone()))?;
        if stored.status != expected {
            return Ok(false);
        }
        *stored = task.clone();
        Ok(true)
    }

    async fn list(
        &self,
        status: Option<TaskStatus>,
    ) -> Result<Vec<BackgroundTask>, RepositoryError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect())
    }

    async fn next_due(&self) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.scheduled_for)
            .min())
    }

    async fn stats(&self, agent_id: Option<&AgentId>) -> Result<TaskStats, RepositoryError> {
        let tasks = self.tasks.lock().unwrap();
        Ok(TaskStats::from_tasks(
            tasks
                .iter()
                .filter(|t| agent_id.is_none_or(|a| &t.agent_id == a)),
        ))
    }

    async fn overview(&self) -> Result<QueueOverview, RepositoryError> {
        Ok(QueueOverview::from_tasks(self.tasks.lock().unwrap().iter()))
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut tasks = self.tasks.lock().unwrap();
        let len = tasks.len();
        tasks.retain(|t| !t.is_purgeable(before));
        Ok(len - tasks.len())
    }
}

/// Collects every record for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub records: Mutex<Vec<PerformanceRecord>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<PerformanceRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl PerformanceSink for RecordingSink {
    fn record(&self, record: PerformanceRecord) {
        self.records.lock().unwrap().push(record);
    }
}

/// Task executor that replays scripted results, then succeeds.
#[derive(Default)]
pub struct ScriptedTaskExecutor {
    script: Mutex<VecDeque<Result<TaskOutput, ExecutorError>>>,
    delay: Option<Duration>,
    pub executed: Mutex<Vec<TaskId>>,
}

impl ScriptedTaskExecutor {
    pub fn new(script: Vec<Result<TaskOutput, ExecutorError>>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn executed(&self) -> Vec<TaskId> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExecutor for ScriptedTaskExecutor {
    async fn execute(&self, task: &BackgroundTask) -> Result<TaskOutput, ExecutorError> {
        self.executed.lock().unwrap().push(task.id.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(TaskOutput::new("ok").with_quality(0.5)))
    }
}
