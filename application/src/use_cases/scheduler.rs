//! Background task scheduler
//!
//! Owns the lifecycle of every [`BackgroundTask`]: validation on submission,
//! atomic dequeue, completion, and retry with exponential backoff. Storage is
//! delegated to a [`TaskRepository`]; the scheduler never executes payloads.

use crate::config::SchedulerParams;
use crate::ports::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use dispatch_domain::{
    AgentId, BackgroundTask, DomainError, FailOutcome, InvalidTransition, MAX_SCHEDULE_DELAY,
    QueueOverview, RepositoryError, RetryPolicy, TaskId, TaskRepository, TaskStats, TaskStatus,
    TaskType,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Errors that can occur while scheduling or reporting on tasks
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid task type: {0}")]
    InvalidTaskType(String),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Delay of {0:?} is beyond the one-year scheduling horizon")]
    DelayOutOfRange(Duration),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<DomainError> for SchedulerError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnknownTaskType(t) => SchedulerError::InvalidTaskType(t),
            DomainError::DelayOutOfRange(d) => SchedulerError::DelayOutOfRange(d),
            other => SchedulerError::InvalidTaskType(other.to_string()),
        }
    }
}

/// When a newly scheduled task becomes eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleAt {
    #[default]
    Now,
    At(DateTime<Utc>),
    After(Duration),
}

/// Input for [`Scheduler::schedule`]
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Task type name; validated against the closed [`TaskType`] set
    pub task_type: String,
    pub priority: i32,
    pub payload: serde_json::Value,
    pub when: ScheduleAt,
    /// Defaults to [`AgentId::system`]
    pub agent_id: Option<AgentId>,
    /// Defaults to the scheduler's configured value
    pub max_retries: Option<u32>,
}

impl ScheduleRequest {
    pub fn new(task_type: impl Into<String>, priority: i32) -> Self {
        Self {
            task_type: task_type.into(),
            priority,
            payload: serde_json::Value::Null,
            when: ScheduleAt::Now,
            agent_id: None,
            max_retries: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn at(mut self, when: DateTime<Utc>) -> Self {
        self.when = ScheduleAt::At(when);
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.when = ScheduleAt::After(delay);
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// Priority scheduler over a [`TaskRepository`].
///
/// All methods take `&self`; share one instance between producers and
/// workers with an `Arc`.
pub struct Scheduler {
    repository: Arc<dyn TaskRepository>,
    clock: Arc<dyn Clock>,
    retry_policy: RetryPolicy,
    default_max_retries: u32,
    wake: Notify,
}

impl Scheduler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        let params = SchedulerParams::default();
        Self {
            repository,
            clock: Arc::new(SystemClock),
            retry_policy: params.retry_policy,
            default_max_retries: params.default_max_retries,
            wake: Notify::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_params(mut self, params: &SchedulerParams) -> Self {
        self.retry_policy = params.retry_policy;
        self.default_max_retries = params.default_max_retries;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Validate and persist a new `pending` task.
    ///
    /// A relative delay longer than [`MAX_SCHEDULE_DELAY`] is rejected.
    pub async fn schedule(&self, request: ScheduleRequest) -> Result<TaskId, SchedulerError> {
        let task_type: TaskType = request.task_type.parse()?;
        let now = self.clock.now();
        let scheduled_for = match request.when {
            ScheduleAt::Now => now,
            ScheduleAt::At(at) => at,
            ScheduleAt::After(delay) => {
                let out_of_range = || SchedulerError::DelayOutOfRange(delay);
                if delay > MAX_SCHEDULE_DELAY {
                    return Err(out_of_range());
                }
                let offset = chrono::Duration::from_std(delay).map_err(|_| out_of_range())?;
                now.checked_add_signed(offset).ok_or_else(out_of_range)?
            }
        };

        let task = BackgroundTask::new(
            task_type,
            request.priority,
            request.payload,
            request.agent_id.unwrap_or_else(AgentId::system),
            now,
        )
        .scheduled_for(scheduled_for)
        .with_max_retries(request.max_retries.unwrap_or(self.default_max_retries));
        let id = task.id.clone();

        self.repository.insert(task).await?;
        info!(
            task_id = %id,
            task_type = %task_type,
            priority = request.priority,
            scheduled_for = %scheduled_for,
            "Scheduled background task"
        );

        if scheduled_for <= now {
            self.wake.notify_one();
        }
        Ok(id)
    }

    /// Claim the most urgent eligible task, if any. Never blocks.
    pub async fn dequeue(&self) -> Result<Option<BackgroundTask>, SchedulerError> {
        let claimed = self.repository.claim_next(self.clock.now()).await?;
        if let Some(task) = &claimed {
            debug!(task_id = %task.id, priority = task.priority, "Dequeued task");
        }
        Ok(claimed)
    }

    /// `running → completed`
    pub async fn complete(
        &self,
        id: &TaskId,
        quality_score: Option<f64>,
    ) -> Result<BackgroundTask, SchedulerError> {
        let mut task = self.running_task(id, "complete").await?;
        task.complete(self.clock.now(), quality_score)?;
        self.commit(&task, "complete").await?;
        info!(task_id = %id, "Task completed");
        Ok(task)
    }

    /// Report a failed execution; retries with backoff until exhausted.
    pub async fn fail(
        &self,
        id: &TaskId,
        error: impl Into<String>,
    ) -> Result<FailOutcome, SchedulerError> {
        let error = error.into();
        let mut task = self.running_task(id, "fail").await?;
        let outcome = task.fail(self.clock.now(), error.as_str(), &self.retry_policy)?;
        self.commit(&task, "fail").await?;

        match &outcome {
            FailOutcome::Retrying {
                retry_count,
                next_attempt,
            } => warn!(
                task_id = %id,
                retry_count = *retry_count,
                next_attempt = %next_attempt,
                "Task failed, retrying: {}", error
            ),
            FailOutcome::Exhausted { retry_count } => warn!(
                task_id = %id,
                retry_count = *retry_count,
                "Task failed permanently: {}", error
            ),
        }
        Ok(outcome)
    }

    /// Current state of a task, for polling callers.
    pub async fn task(&self, id: &TaskId) -> Result<BackgroundTask, SchedulerError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| SchedulerError::TaskNotFound(id.clone()))
    }

    pub async fn list(
        &self,
        status: Option<TaskStatus>,
    ) -> Result<Vec<BackgroundTask>, SchedulerError> {
        Ok(self.repository.list(status).await?)
    }

    pub async fn stats(&self, agent_id: Option<&AgentId>) -> Result<TaskStats, SchedulerError> {
        Ok(self.repository.stats(agent_id).await?)
    }

    pub async fn overview(&self) -> Result<QueueOverview, SchedulerError> {
        Ok(self.repository.overview().await?)
    }

    /// Earliest `scheduled_for` among pending tasks.
    pub async fn next_due(&self) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        Ok(self.repository.next_due().await?)
    }

    /// Delete tasks that finished more than `retention` ago.
    pub async fn purge_finished(&self, retention: Duration) -> Result<usize, SchedulerError> {
        let Some(cutoff) = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|r| self.clock.now().checked_sub_signed(r))
        else {
            // Nothing can have finished that long ago.
            return Ok(0);
        };
        let purged = self.repository.purge_finished(cutoff).await?;
        if purged > 0 {
            info!(purged, cutoff = %cutoff, "Purged finished tasks");
        }
        Ok(purged)
    }

    /// Resolves once `schedule` persists immediately eligible work. A wake-up
    /// with no waiter is kept for the next caller.
    pub async fn notified(&self) {
        self.wake.notified().await
    }

    async fn running_task(
        &self,
        id: &TaskId,
        action: &'static str,
    ) -> Result<BackgroundTask, SchedulerError> {
        let task = self.task(id).await?;
        if task.status != TaskStatus::Running {
            return Err(InvalidTransition {
                id: id.clone(),
                status: task.status,
                action,
            }
            .into());
        }
        Ok(task)
    }

    /// Write back a transition made from `running`; losing the race to
    /// another reporter is an invalid transition.
    async fn commit(
        &self,
        task: &BackgroundTask,
        action: &'static str,
    ) -> Result<(), SchedulerError> {
        if self
            .repository
            .compare_and_swap(task, TaskStatus::Running)
            .await?
        {
            return Ok(());
        }
        let current = self.task(&task.id).await?;
        Err(InvalidTransition {
            id: task.id.clone(),
            status: current.status,
            action,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::ManualClock;
    use crate::test_support::{MockRepository, t0};

    fn scheduler() -> (Scheduler, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let scheduler = Scheduler::new(Arc::new(MockRepository::default()))
            .with_clock(clock.clone())
            .with_params(&SchedulerParams::default().with_retry_policy(
                RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(60)).unwrap(),
            ));
        (scheduler, clock)
    }

    #[tokio::test]
    async fn test_schedule_rejects_unknown_type() {
        let (scheduler, _) = scheduler();
        let err = scheduler
            .schedule(ScheduleRequest::new("cleanup", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidTaskType(t) if t == "cleanup"));
        assert_eq!(scheduler.overview().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_schedule_defaults() {
        let (scheduler, _) = scheduler();
        let id = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 5))
            .await
            .unwrap();
        let task = scheduler.task(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.agent_id, AgentId::system());
        assert_eq!(task.max_retries, 3);
        assert_eq!(task.scheduled_for, t0());
    }

    #[tokio::test]
    async fn test_dequeue_priority_order() {
        let (scheduler, clock) = scheduler();
        let mut ids = Vec::new();
        for priority in [1, 3, 2] {
            ids.push(
                scheduler
                    .schedule(ScheduleRequest::new("data_maintenance", priority))
                    .await
                    .unwrap(),
            );
            clock.advance(chrono::Duration::seconds(1));
        }

        let order: Vec<i32> = [
            scheduler.dequeue().await.unwrap().unwrap(),
            scheduler.dequeue().await.unwrap().unwrap(),
            scheduler.dequeue().await.unwrap().unwrap(),
        ]
        .iter()
        .map(|t| t.priority)
        .collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert!(scheduler.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_equal_priority_dequeues_oldest_first() {
        let (scheduler, clock) = scheduler();
        let first = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 2))
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(1));
        scheduler
            .schedule(ScheduleRequest::new("agent_learning", 2))
            .await
            .unwrap();

        assert_eq!(scheduler.dequeue().await.unwrap().unwrap().id, first);
    }

    #[tokio::test]
    async fn test_delayed_task_is_invisible_until_due() {
        let (scheduler, clock) = scheduler();
        let id = scheduler
            .schedule(
                ScheduleRequest::new("data_maintenance", 5)
                    .with_payload(serde_json::json!({"scope": "history"}))
                    .after(Duration::from_secs(60))
                    .with_agent("system"),
            )
            .await
            .unwrap();

        assert!(scheduler.dequeue().await.unwrap().is_none());

        clock.advance(chrono::Duration::seconds(59));
        assert!(scheduler.dequeue().await.unwrap().is_none());

        clock.advance(chrono::Duration::seconds(1));
        let task = scheduler.dequeue().await.unwrap().unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.started_at, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_delay_beyond_horizon_is_rejected() {
        let (scheduler, _) = scheduler();
        let delay = MAX_SCHEDULE_DELAY + Duration::from_secs(1);
        let err = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 1).after(delay))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DelayOutOfRange(d) if d == delay));
        assert_eq!(scheduler.overview().await.unwrap().total(), 0);

        let id = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 1).after(MAX_SCHEDULE_DELAY))
            .await
            .unwrap();
        assert_eq!(
            scheduler.task(&id).await.unwrap().scheduled_for,
            t0() + chrono::Duration::days(365)
        );
    }

    #[tokio::test]
    async fn test_purge_finished_respects_retention() {
        let (scheduler, clock) = scheduler();
        let done = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 1))
            .await
            .unwrap();
        let running = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 2))
            .await
            .unwrap();
        let waiting = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 3))
            .await
            .unwrap();
        scheduler.dequeue().await.unwrap();
        scheduler.complete(&done, None).await.unwrap();
        scheduler.dequeue().await.unwrap();

        let day = Duration::from_secs(86_400);
        assert_eq!(scheduler.purge_finished(day).await.unwrap(), 0);

        clock.advance(chrono::Duration::days(2));
        assert_eq!(scheduler.purge_finished(day).await.unwrap(), 1);
        assert!(matches!(
            scheduler.task(&done).await.unwrap_err(),
            SchedulerError::TaskNotFound(_)
        ));
        assert_eq!(
            scheduler.task(&running).await.unwrap().status,
            TaskStatus::Running
        );
        assert_eq!(
            scheduler.task(&waiting).await.unwrap().status,
            TaskStatus::Pending
        );
        assert_eq!(scheduler.purge_finished(Duration::MAX).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_complete_requires_dequeue() {
        let (scheduler, _) = scheduler();
        let id = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 1))
            .await
            .unwrap();

        let err = scheduler.complete(&id, None).await.unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::InvalidTransition(InvalidTransition { status: TaskStatus::Pending, .. })
        ));

        scheduler.dequeue().await.unwrap();
        let task = scheduler.complete(&id, Some(0.7)).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.completed_at.is_some());
        assert!(scheduler.complete(&id, None).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_task_id() {
        let (scheduler, _) = scheduler();
        let err = scheduler.fail(&TaskId::new("nope"), "x").await.unwrap_err();
        assert!(matches!(err, SchedulerError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_retry_backoff_then_exhaustion() {
        let (scheduler, clock) = scheduler();
        let id = scheduler
            .schedule(ScheduleRequest::new("price_monitoring", 3))
            .await
            .unwrap();

        let mut last_scheduled = t0();
        for attempt in 1..=3u32 {
            let task = scheduler.dequeue().await.unwrap().unwrap();
            assert_eq!(task.id, id);

            let outcome = scheduler.fail(&id, "upstream 503").await.unwrap();
            let FailOutcome::Retrying {
                retry_count,
                next_attempt,
            } = outcome
            else {
                panic!("expected retry on attempt {attempt}");
            };
            assert_eq!(retry_count, attempt);
            // base 1s * 2^retry_count
            assert_eq!(
                next_attempt,
                clock.now() + chrono::Duration::seconds(1 << attempt)
            );
            assert!(next_attempt > last_scheduled);
            last_scheduled = next_attempt;

            // Not eligible again until the backoff elapses.
            assert!(scheduler.dequeue().await.unwrap().is_none());
            clock.set(next_attempt);
        }

        scheduler.dequeue().await.unwrap().unwrap();
        let outcome = scheduler.fail(&id, "still down").await.unwrap();
        assert_eq!(outcome, FailOutcome::Exhausted { retry_count: 3 });

        let task = scheduler.task(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.last_error.as_deref(), Some("still down"));
        assert!(task.completed_at.is_some());

        // Further reports are explicit errors and leave the task failed.
        assert!(matches!(
            scheduler.fail(&id, "again").await.unwrap_err(),
            SchedulerError::InvalidTransition(_)
        ));
        assert_eq!(
            scheduler.task(&id).await.unwrap().status,
            TaskStatus::Failed
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dequeue_never_duplicates() {
        let (scheduler, _) = scheduler();
        let scheduler = Arc::new(scheduler);
        for priority in 0..3 {
            scheduler
                .schedule(ScheduleRequest::new("agent_learning", priority))
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..10 {
            let scheduler = Arc::clone(&scheduler);
            handles.push(tokio::spawn(async move { scheduler.dequeue().await.unwrap() }));
        }

        let mut claimed = Vec::new();
        for handle in handles {
            if let Some(task) = handle.await.unwrap() {
                claimed.push(task.id);
            }
        }
        claimed.sort();
        claimed.dedup();
        assert_eq!(claimed.len(), 3);
        assert_eq!(scheduler.overview().await.unwrap().running, 3);
    }

    #[tokio::test]
    async fn test_stats_by_agent() {
        let (scheduler, clock) = scheduler();
        for (agent, succeed) in [("research", true), ("research", false), ("shopping", true)] {
            let id = scheduler
                .schedule(
                    ScheduleRequest::new("research_monitoring", 1)
                        .with_agent(agent)
                        .with_max_retries(0),
                )
                .await
                .unwrap();
            scheduler.dequeue().await.unwrap().unwrap();
            clock.advance(chrono::Duration::milliseconds(100));
            if succeed {
                scheduler.complete(&id, Some(1.0)).await.unwrap();
            } else {
                scheduler.fail(&id, "boom").await.unwrap();
            }
        }

        let all = scheduler.stats(None).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.completed, 2);

        let research = scheduler.stats(Some(&AgentId::new("research"))).await.unwrap();
        assert_eq!(research.total, 2);
        assert!((research.success_rate - 0.5).abs() < 1e-9);
        assert!((research.avg_duration_ms - 100.0).abs() < 1e-9);
        assert_eq!(research.avg_quality, Some(1.0));
    }

    #[tokio::test]
    async fn test_schedule_wakes_waiters() {
        let (scheduler, _) = scheduler();
        let scheduler = Arc::new(scheduler);
        let waiter = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.notified().await })
        };
        tokio::task::yield_now().await;

        scheduler
            .schedule(ScheduleRequest::new("agent_learning", 1))
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be woken")
            .unwrap();
    }
}
