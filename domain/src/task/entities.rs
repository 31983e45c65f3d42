//! Background task entity and its lifecycle.

use super::retry::RetryPolicy;
use super::value_objects::{AgentId, TaskId};
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of retries before a task fails permanently.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Closed set of background work kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    AutonomousGoalExecution,
    ResearchMonitoring,
    PriceMonitoring,
    DataMaintenance,
    AgentLearning,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::AutonomousGoalExecution,
        TaskType::ResearchMonitoring,
        TaskType::PriceMonitoring,
        TaskType::DataMaintenance,
        TaskType::AgentLearning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::AutonomousGoalExecution => "autonomous_goal_execution",
            TaskType::ResearchMonitoring => "research_monitoring",
            TaskType::PriceMonitoring => "price_monitoring",
            TaskType::DataMaintenance => "data_maintenance",
            TaskType::AgentLearning => "agent_learning",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownTaskType(s.to_string()))
    }
}

/// Status of a background task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for `scheduled_for` and a free worker
    #[default]
    Pending,
    /// Claimed by a worker
    Running,
    /// Finished successfully
    Completed,
    /// Retries exhausted
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::Running,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| DomainError::UnknownTaskStatus(s.to_string()))
    }
}

/// Attempted a lifecycle step the current status does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {action} task {id} while it is {status}")]
pub struct InvalidTransition {
    pub id: TaskId,
    pub status: TaskStatus,
    pub action: &'static str,
}

/// Result of reporting a failed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FailOutcome {
    /// Returned to `pending`, eligible again at `next_attempt`.
    Retrying {
        retry_count: u32,
        next_attempt: DateTime<Utc>,
    },
    /// Moved to `failed` permanently.
    Exhausted { retry_count: u32 },
}

/// A persisted unit of deferred or recurring work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTask {
    pub id: TaskId,
    pub task_type: TaskType,
    /// Lower value = more urgent
    pub priority: i32,
    pub status: TaskStatus,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub scheduled_for: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Set when the task reaches a terminal status
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    pub agent_id: AgentId,
    /// Quality reported by the executor on success (0.0 - 1.0)
    pub quality_score: Option<f64>,
}

impl BackgroundTask {
    pub fn new(
        task_type: TaskType,
        priority: i32,
        payload: serde_json::Value,
        agent_id: impl Into<AgentId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            task_type,
            priority,
            status: TaskStatus::Pending,
            payload,
            created_at: now,
            scheduled_for: now,
            started_at: None,
            completed_at: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            last_error: None,
            agent_id: agent_id.into(),
            quality_score: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_for = at;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Pending and due.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending && self.scheduled_for <= now
    }

    /// Wall time between start and finish, once finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(finished)) => Some(finished - started),
            _ => None,
        }
    }

    /// `pending → running`
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.expect_status(TaskStatus::Pending, "start")?;
        self.status = TaskStatus::Running;
        self.started_at = Some(now);
        Ok(())
    }

    /// `running → completed`
    pub fn complete(
        &mut self,
        now: DateTime<Utc>,
        quality_score: Option<f64>,
    ) -> Result<(), InvalidTransition> {
        self.expect_status(TaskStatus::Running, "complete")?;
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
        self.quality_score = quality_score;
        Ok(())
    }

    /// `running → pending` with backoff, or `running → failed` once
    /// `retry_count` has reached `max_retries`.
    pub fn fail(
        &mut self,
        now: DateTime<Utc>,
        error: impl Into<String>,
        policy: &RetryPolicy,
    ) -> Result<FailOutcome, InvalidTransition> {
        self.expect_status(TaskStatus::Running, "fail")?;
        self.last_error = Some(error.into());

        if self.retry_count < self.max_retries {
            self.retry_count += 1;
            let next_attempt = now + policy.delay_for(self.retry_count);
            self.status = TaskStatus::Pending;
            self.scheduled_for = next_attempt;
            Ok(FailOutcome::Retrying {
                retry_count: self.retry_count,
                next_attempt,
            })
        } else {
            self.status = TaskStatus::Failed;
            self.completed_at = Some(now);
            Ok(FailOutcome::Exhausted {
                retry_count: self.retry_count,
            })
        }
    }

    /// Finished before `before`; pending and running tasks never qualify.
    pub fn is_purgeable(&self, before: DateTime<Utc>) -> bool {
        self.status.is_terminal() && self.completed_at.unwrap_or(self.created_at) < before
    }

    /// `running → pending` without consuming a retry, for work whose worker
    /// went away before reporting an outcome.
    pub fn requeue_interrupted(&mut self) -> Result<(), InvalidTransition> {
        self.expect_status(TaskStatus::Running, "requeue")?;
        self.status = TaskStatus::Pending;
        self.started_at = None;
        self.last_error = Some("interrupted before reporting an outcome".to_string());
        Ok(())
    }

    fn expect_status(
        &self,
        expected: TaskStatus,
        action: &'static str,
    ) -> Result<(), InvalidTransition> {
        if self.status == expected {
            Ok(())
        } else {
            Err(InvalidTransition {
                id: self.id.clone(),
                status: self.status,
                action,
            })
        }
    }
}
