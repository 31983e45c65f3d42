//! Classify-and-plan use case
//!
//! The inbound entry point for a chat request: classify the text, build an
//! execution plan, and (via [`submit`](ClassifyAndPlanUseCase::submit))
//! hand any deferred work to the [`Scheduler`].

use super::scheduler::{ScheduleRequest, Scheduler, SchedulerError};
use dispatch_domain::{Classification, ExecutionPlan, PlanBuilder, TaskClassifier, TaskId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// A planned request plus the background task it spawned, if any.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedRequest {
    pub classification: Classification,
    pub plan: ExecutionPlan,
    pub scheduled_task: Option<TaskId>,
}

/// Use case for routing a request to agents
pub struct ClassifyAndPlanUseCase {
    classifier: Arc<TaskClassifier>,
    builder: PlanBuilder,
    scheduler: Option<Arc<Scheduler>>,
}

impl ClassifyAndPlanUseCase {
    pub fn new(classifier: Arc<TaskClassifier>, builder: PlanBuilder) -> Self {
        Self {
            classifier,
            builder,
            scheduler: None,
        }
    }

    /// Enable scheduling of deferred work in [`submit`](Self::submit).
    pub fn with_scheduler(mut self, scheduler: Arc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn classify(&self, request: &str) -> Classification {
        self.classifier.classify(request)
    }

    /// Always returns a plan, even for unscoreable text.
    pub fn plan(&self, request: &str) -> ExecutionPlan {
        self.build(request).1
    }

    /// Classify, plan, and schedule the plan's deferred work.
    ///
    /// Without a scheduler the deferred work stays on the plan unscheduled.
    pub async fn submit(&self, request: &str) -> Result<RoutedRequest, SchedulerError> {
        let (classification, plan) = self.build(request);

        let scheduled_task = match (&plan.deferred, &self.scheduler) {
            (Some(deferred), Some(scheduler)) => {
                let payload = serde_json::json!({
                    "request": plan.request,
                    "plan_id": plan.plan_id,
                    "primary_agent": classification.primary_agent,
                    "rule": deferred.rule,
                });
                let id = scheduler
                    .schedule(
                        ScheduleRequest::new(deferred.task_type.as_str(), deferred.priority)
                            .with_payload(payload)
                            .with_agent(classification.primary_agent.as_str()),
                    )
                    .await?;
                info!(
                    plan_id = %plan.plan_id,
                    task_id = %id,
                    rule = %deferred.rule,
                    "Scheduled deferred work"
                );
                Some(id)
            }
            (Some(deferred), None) => {
                debug!(rule = %deferred.rule, "No scheduler configured; deferred work not scheduled");
                None
            }
            (None, _) => None,
        };

        Ok(RoutedRequest {
            classification,
            plan,
            scheduled_task,
        })
    }

    fn build(&self, request: &str) -> (Classification, ExecutionPlan) {
        let classification = self.classifier.classify(request);
        let plan = self.builder.build(&classification);
        debug!(
            primary = %classification.primary_agent,
            confidence = classification.confidence,
            complexity = %classification.complexity,
            steps = plan.steps.len(),
            "Planned request"
        );
        (classification, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRepository;
    use dispatch_domain::{AgentType, TaskStatus, TaskType};

    fn use_case() -> (ClassifyAndPlanUseCase, Arc<Scheduler>) {
        let scheduler = Arc::new(Scheduler::new(Arc::new(MockRepository::default())));
        let use_case = ClassifyAndPlanUseCase::new(
            Arc::new(TaskClassifier::default()),
            PlanBuilder::default(),
        )
        .with_scheduler(scheduler.clone());
        (use_case, scheduler)
    }

    #[test]
    fn test_plan_for_nonsense_is_single_step() {
        let (use_case, _) = use_case();
        let plan = use_case.plan("zzz qqq");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.primary().unwrap().agent, AgentType::Research);
        assert_eq!(plan.confidence, 0);
    }

    #[tokio::test]
    async fn test_submit_schedules_deferred_work() {
        let (use_case, scheduler) = use_case();
        let routed = use_case
            .submit("set a price alert for the new phone")
            .await
            .unwrap();

        let id = routed.scheduled_task.expect("deferred work should be scheduled");
        let task = scheduler.task(&id).await.unwrap();
        assert_eq!(task.task_type, TaskType::PriceMonitoring);
        assert_eq!(task.priority, 3);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.agent_id.as_str(), routed.classification.primary_agent.as_str());
        assert_eq!(task.payload["plan_id"], routed.plan.plan_id.as_str());
        assert_eq!(task.payload["request"], "set a price alert for the new phone");
    }

    #[tokio::test]
    async fn test_submit_without_deferral_schedules_nothing() {
        let (use_case, scheduler) = use_case();
        let routed = use_case.submit("find best laptop deals").await.unwrap();
        assert!(routed.scheduled_task.is_none());
        assert_eq!(routed.plan.primary().unwrap().agent, AgentType::Shopping);
        assert_eq!(scheduler.overview().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_submit_without_scheduler_keeps_deferral_on_plan() {
        let use_case = ClassifyAndPlanUseCase::new(
            Arc::new(TaskClassifier::default()),
            PlanBuilder::default(),
        );
        let routed = use_case.submit("keep me updated on rust releases").await.unwrap();
        assert!(routed.scheduled_task.is_none());
        assert_eq!(
            routed.plan.deferred.unwrap().task_type,
            TaskType::ResearchMonitoring
        );
    }
}
