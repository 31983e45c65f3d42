//! Task executor port
//!
//! Performs the work described by a claimed [`BackgroundTask`].

use super::agent_executor::ExecutorError;
use async_trait::async_trait;
use dispatch_domain::BackgroundTask;

/// Result of a successful background task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput {
    pub summary: String,
    pub quality_score: Option<f64>,
}

impl TaskOutput {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            quality_score: None,
        }
    }

    pub fn with_quality(mut self, score: f64) -> Self {
        self.quality_score = Some(score.clamp(0.0, 1.0));
        self
    }
}

/// Port for executing background tasks.
///
/// Called with the task already in `running`; the worker pool reports the
/// outcome back to the scheduler.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &BackgroundTask) -> Result<TaskOutput, ExecutorError>;
}
