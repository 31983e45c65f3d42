//! Dispatch Plan use case
//!
//! Runs the immediate steps of an [`ExecutionPlan`] against an
//! [`AgentExecutor`]: the primary step first, then all supporting steps
//! concurrently. Each step runs under its own `timeout_budget`.

use crate::ports::agent_executor::{AgentExecutor, AgentOutput, ExecutorError};
use crate::ports::performance_sink::{NoTelemetry, PerformanceRecord, PerformanceSink};
use dispatch_domain::{AgentType, ExecutionPlan, PlanStep, StepRole};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Result of one plan step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub agent: AgentType,
    pub role: StepRole,
    pub success: bool,
    pub duration_ms: u64,
    /// Agent output on success
    pub content: Option<String>,
    pub quality_score: Option<f64>,
    /// Failure, timeout or skip reason
    pub error: Option<String>,
}

impl StepReport {
    fn from_result(
        step: &PlanStep,
        duration_ms: u64,
        result: Result<AgentOutput, ExecutorError>,
    ) -> Self {
        let (content, quality_score, error) = match result {
            Ok(output) => (Some(output.content), output.quality_score, None),
            Err(e) => (None, None, Some(e.to_string())),
        };
        Self {
            agent: step.agent,
            role: step.role,
            success: error.is_none(),
            duration_ms,
            content,
            quality_score,
            error,
        }
    }

    fn skipped(step: &PlanStep, reason: &str) -> Self {
        Self {
            agent: step.agent,
            role: step.role,
            success: false,
            duration_ms: 0,
            content: None,
            quality_score: None,
            error: Some(reason.to_string()),
        }
    }
}

/// Outcome of dispatching a whole plan.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub plan_id: String,
    /// In plan order
    pub steps: Vec<StepReport>,
}

impl DispatchReport {
    pub fn primary(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.role == StepRole::Primary)
    }

    /// True when the primary step succeeded.
    pub fn is_success(&self) -> bool {
        self.primary().is_some_and(|s| s.success)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.success)
    }
}

/// Use case for executing an execution plan's immediate steps
pub struct DispatchPlanUseCase {
    executor: Arc<dyn AgentExecutor>,
    telemetry: Arc<dyn PerformanceSink>,
}

impl DispatchPlanUseCase {
    pub fn new(executor: Arc<dyn AgentExecutor>) -> Self {
        Self {
            executor,
            telemetry: Arc::new(NoTelemetry),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn PerformanceSink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Run the plan. Step failures are reported, never returned as errors.
    ///
    /// Supporting steps only run after the primary step succeeds; otherwise
    /// they are reported as skipped.
    pub async fn execute(&self, plan: &ExecutionPlan) -> DispatchReport {
        info!(
            plan_id = %plan.plan_id,
            steps = plan.steps.len(),
            "Dispatching plan"
        );

        let mut steps = Vec::with_capacity(plan.steps.len());

        let primary_ok = match plan.primary() {
            Some(primary) => {
                let report = self.run_step(primary, plan).await;
                let ok = report.success;
                steps.push(report);
                ok
            }
            None => false,
        };

        let supporting: Vec<&PlanStep> = plan.supporting().collect();
        if primary_ok {
            let reports = join_all(supporting.iter().map(|step| self.run_step(step, plan))).await;
            steps.extend(reports);
        } else {
            if !supporting.is_empty() {
                warn!(
                    plan_id = %plan.plan_id,
                    "Primary step failed, skipping {} supporting step(s)",
                    supporting.len()
                );
            }
            steps.extend(
                supporting
                    .iter()
                    .map(|step| StepReport::skipped(step, "primary step failed")),
            );
        }

        DispatchReport {
            plan_id: plan.plan_id.clone(),
            steps,
        }
    }

    async fn run_step(&self, step: &PlanStep, plan: &ExecutionPlan) -> StepReport {
        let started = Instant::now();
        let result =
            match tokio::time::timeout(step.timeout_budget, self.executor.execute(step, plan)).await
            {
                Ok(result) => result,
                Err(_) => Err(ExecutorError::TimedOut(step.timeout_budget)),
            };
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(agent = %step.agent, role = %step.role, duration_ms, "Step succeeded"),
            Err(e) => warn!(agent = %step.agent, role = %step.role, "Step failed: {}", e),
        }

        let report = StepReport::from_result(step, duration_ms, result);
        self.telemetry.record(
            PerformanceRecord::new(
                step.agent.as_str(),
                step.role.as_str(),
                duration_ms,
                report.success,
            )
            .with_quality(report.quality_score),
        );
        report
    }
}
