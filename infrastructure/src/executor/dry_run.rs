//! Dry-run executor
//!
//! Stands in for real agents: logs what would run and reports success.
//! Used by the CLI so plans and the task queue can be exercised end to end
//! without any agent backend.

use async_trait::async_trait;
use dispatch_application::ports::agent_executor::{AgentExecutor, AgentOutput, ExecutorError};
use dispatch_application::ports::task_executor::{TaskExecutor, TaskOutput};
use dispatch_domain::{BackgroundTask, ExecutionPlan, PlanStep, truncate};
use std::time::Duration;
use tracing::info;

/// Executor that performs no work.
#[derive(Debug, Clone, Default)]
pub struct DryRunExecutor {
    latency: Duration,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated time spent per step or task.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl AgentExecutor for DryRunExecutor {
    async fn execute(
        &self,
        step: &PlanStep,
        plan: &ExecutionPlan,
    ) -> Result<AgentOutput, ExecutorError> {
        info!(
            plan_id = %plan.plan_id,
            agent = %step.agent,
            role = %step.role,
            budget_secs = step.timeout_budget.as_secs(),
            "[dry-run] agent step"
        );
        self.pause().await;
        Ok(AgentOutput::new(format!(
            "[dry-run] {} ({}) would handle: {}",
            step.agent.display_name(),
            step.role,
            truncate(&plan.request, 80)
        ))
        .with_quality(1.0))
    }
}

#[async_trait]
impl TaskExecutor for DryRunExecutor {
    async fn execute(&self, task: &BackgroundTask) -> Result<TaskOutput, ExecutorError> {
        info!(
            task_id = %task.id,
            task_type = %task.task_type,
            agent_id = %task.agent_id,
            attempt = task.retry_count + 1,
            "[dry-run] background task"
        );
        self.pause().await;
        Ok(TaskOutput::new(format!("[dry-run] {} done", task.task_type)).with_quality(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain::{AgentId, PlanBuilder, TaskClassifier, TaskType};

    #[tokio::test]
    async fn test_agent_step_succeeds() {
        let plan = PlanBuilder::default().build(&TaskClassifier::default().classify("open github"));
        let output = AgentExecutor::execute(&DryRunExecutor::new(), &plan.steps[0], &plan)
            .await
            .unwrap();
        assert!(output.content.contains("Navigation"));
        assert_eq!(output.quality_score, Some(1.0));
    }

    #[tokio::test]
    async fn test_task_succeeds() {
        let task = BackgroundTask::new(
            TaskType::DataMaintenance,
            5,
            serde_json::Value::Null,
            AgentId::system(),
            chrono::Utc::now(),
        );
        let output = TaskExecutor::execute(&DryRunExecutor::new(), &task)
            .await
            .unwrap();
        assert!(output.summary.contains("data_maintenance"));
    }
}
