//! Agent executor port
//!
//! Runs a single plan step against a concrete agent. Implementations live in
//! the infrastructure layer (or the host application).

use async_trait::async_trait;
use dispatch_domain::{ExecutionPlan, PlanStep};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while executing agent work
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Execution failed: {0}")]
    Failed(String),

    #[error("Execution timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Execution cancelled")]
    Cancelled,
}

/// What an agent produced for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    pub content: String,
    /// 0.0 - 1.0, when the agent can judge its own result
    pub quality_score: Option<f64>,
}

impl AgentOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            quality_score: None,
        }
    }

    pub fn with_quality(mut self, score: f64) -> Self {
        self.quality_score = Some(score.clamp(0.0, 1.0));
        self
    }
}

/// Port for running plan steps.
///
/// The step's `timeout_budget` is enforced by the caller; an executor may
/// also stop early on its own.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        step: &PlanStep,
        plan: &ExecutionPlan,
    ) -> Result<AgentOutput, ExecutorError>;
}
