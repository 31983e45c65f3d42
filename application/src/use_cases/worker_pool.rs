//! Worker pool
//!
//! Pulls tasks from the [`Scheduler`] and hands them to a [`TaskExecutor`],
//! at most `concurrency` at a time. Every outcome is reported back through
//! `complete`/`fail`, so timeouts and executor errors share the retry path.

use super::scheduler::{Scheduler, SchedulerError};
use crate::config::SchedulerParams;
use crate::ports::agent_executor::ExecutorError;
use crate::ports::performance_sink::{NoTelemetry, PerformanceRecord, PerformanceSink};
use crate::ports::task_executor::TaskExecutor;
use dispatch_domain::{BackgroundTask, FailOutcome};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Minimum spacing between purges of finished tasks in [`WorkerPool::run`].
const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// What happened to one dequeued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    Completed,
    Retrying,
    Failed,
    /// The outcome could not be recorded (storage error or lost race)
    Unreported,
}

/// Totals for one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub completed: usize,
    pub retried: usize,
    pub failed: usize,
    pub unreported: usize,
}

impl WorkerSummary {
    pub fn processed(&self) -> usize {
        self.completed + self.retried + self.failed + self.unreported
    }

    fn absorb(&mut self, outcome: WorkOutcome) {
        match outcome {
            WorkOutcome::Completed => self.completed += 1,
            WorkOutcome::Retrying => self.retried += 1,
            WorkOutcome::Failed => self.failed += 1,
            WorkOutcome::Unreported => self.unreported += 1,
        }
    }
}

/// Executes scheduled tasks concurrently.
pub struct WorkerPool {
    scheduler: Arc<Scheduler>,
    executor: Arc<dyn TaskExecutor>,
    telemetry: Arc<dyn PerformanceSink>,
    params: SchedulerParams,
}

impl WorkerPool {
    pub fn new(scheduler: Arc<Scheduler>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            scheduler,
            executor,
            telemetry: Arc::new(NoTelemetry),
            params: SchedulerParams::default(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn PerformanceSink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_params(mut self, params: SchedulerParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Work until `cancel` fires, then wait for in-flight tasks.
    ///
    /// Idle workers wake on new eligible work, when the earliest delayed
    /// task comes due, or after `poll_interval`, whichever comes first.
    /// Finished tasks past `retention` are purged at most hourly.
    pub async fn run(&self, cancel: CancellationToken) -> WorkerSummary {
        info!(concurrency = self.params.concurrency, "Worker pool started");
        let semaphore = Arc::new(Semaphore::new(self.params.concurrency.max(1)));
        let mut join_set = JoinSet::new();
        let mut summary = WorkerSummary::default();
        let mut last_purge = None;

        loop {
            while let Some(joined) = join_set.try_join_next() {
                summary.absorb(Self::joined_outcome(joined));
            }

            let permit = tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => permit,
                _ = cancel.cancelled() => break,
            };
            let Ok(permit) = permit else { break };

            match self.scheduler.dequeue().await {
                Ok(Some(task)) => {
                    let worker = self.worker();
                    join_set.spawn(async move {
                        let outcome = worker.process(task).await;
                        drop(permit);
                        outcome
                    });
                }
                Ok(None) => {
                    drop(permit);
                    self.purge_if_due(&mut last_purge).await;
                    let wait = self.idle_wait().await;
                    tokio::select! {
                        _ = self.scheduler.notified() => {}
                        _ = tokio::time::sleep(wait) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
                Err(e) => {
                    drop(permit);
                    warn!("Dequeue failed: {}", e);
                    tokio::select! {
                        _ = tokio::time::sleep(self.params.poll_interval) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
            }
        }

        debug!(in_flight = join_set.len(), "Worker pool draining");
        while let Some(joined) = join_set.join_next().await {
            summary.absorb(Self::joined_outcome(joined));
        }
        info!(processed = summary.processed(), "Worker pool stopped");
        summary
    }

    /// Process every currently eligible task, returning once nothing is
    /// eligible and nothing is in flight.
    ///
    /// Retries scheduled into the future are left pending.
    pub async fn run_until_idle(&self) -> Result<WorkerSummary, SchedulerError> {
        let concurrency = self.params.concurrency.max(1);
        let mut join_set = JoinSet::new();
        let mut summary = WorkerSummary::default();

        loop {
            while join_set.len() < concurrency {
                let Some(task) = self.scheduler.dequeue().await? else {
                    break;
                };
                let worker = self.worker();
                join_set.spawn(async move { worker.process(task).await });
            }

            match join_set.join_next().await {
                Some(joined) => summary.absorb(Self::joined_outcome(joined)),
                None => break,
            }
        }

        info!(
            completed = summary.completed,
            retried = summary.retried,
            failed = summary.failed,
            "Queue drained"
        );
        self.purge_if_due(&mut None).await;
        Ok(summary)
    }

    /// Time until the next delayed task is due, capped at `poll_interval`.
    async fn idle_wait(&self) -> Duration {
        let poll = self.params.poll_interval;
        match self.scheduler.next_due().await {
            Ok(Some(due)) => (due - self.scheduler.now())
                .to_std()
                .map_or(Duration::ZERO, |until| until.min(poll)),
            Ok(None) => poll,
            Err(e) => {
                debug!("Could not read next due time: {}", e);
                poll
            }
        }
    }

    async fn purge_if_due(&self, last: &mut Option<Instant>) {
        let Some(retention) = self.params.retention else {
            return;
        };
        if last.is_some_and(|at| at.elapsed() < PURGE_INTERVAL) {
            return;
        }
        *last = Some(Instant::now());
        if let Err(e) = self.scheduler.purge_finished(retention).await {
            warn!("Purging finished tasks failed: {}", e);
        }
    }

    fn worker(&self) -> Worker {
        Worker {
            scheduler: Arc::clone(&self.scheduler),
            executor: Arc::clone(&self.executor),
            telemetry: Arc::clone(&self.telemetry),
            params: self.params.clone(),
        }
    }

    fn joined_outcome(joined: Result<WorkOutcome, tokio::task::JoinError>) -> WorkOutcome {
        joined.unwrap_or_else(|e| {
            warn!("Worker task join error: {}", e);
            WorkOutcome::Unreported
        })
    }
}

/// Per-task handle moved into each spawned job.
struct Worker {
    scheduler: Arc<Scheduler>,
    executor: Arc<dyn TaskExecutor>,
    telemetry: Arc<dyn PerformanceSink>,
    params: SchedulerParams,
}

impl Worker {
    async fn process(self, task: BackgroundTask) -> WorkOutcome {
        debug!(task_id = %task.id, task_type = %task.task_type, "Executing task");
        let started = Instant::now();
        let timeout = self.params.task_timeout;

        let result = match tokio::time::timeout(timeout, self.executor.execute(&task)).await {
            Ok(result) => result,
            Err(_) => Err(ExecutorError::TimedOut(timeout)),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let record = PerformanceRecord::new(
            task.agent_id.clone(),
            task.task_type.as_str(),
            duration_ms,
            result.is_ok(),
        );

        match result {
            Ok(output) => {
                self.telemetry
                    .record(record.with_quality(output.quality_score));
                match self.scheduler.complete(&task.id, output.quality_score).await {
                    Ok(_) => WorkOutcome::Completed,
                    Err(e) => {
                        warn!(task_id = %task.id, "Could not record completion: {}", e);
                        WorkOutcome::Unreported
                    }
                }
            }
            Err(error) => {
                self.telemetry.record(record);
                match self.scheduler.fail(&task.id, error.to_string()).await {
                    Ok(FailOutcome::Retrying { .. }) => WorkOutcome::Retrying,
                    Ok(FailOutcome::Exhausted { .. }) => WorkOutcome::Failed,
                    Err(e) => {
                        warn!(task_id = %task.id, "Could not record failure: {}", e);
                        WorkOutcome::Unreported
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::ManualClock;
    use crate::ports::task_executor::TaskOutput;
    use crate::test_support::{MockRepository, RecordingSink, ScriptedTaskExecutor, t0};
    use crate::use_cases::scheduler::ScheduleRequest;
    use async_trait::async_trait;
    use dispatch_domain::{TaskStatus, TaskType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manual_scheduler() -> Arc<Scheduler> {
        Arc::new(
            Scheduler::new(Arc::new(MockRepository::default()))
                .with_clock(Arc::new(ManualClock::new(t0()))),
        )
    }

    /// Tracks the peak number of concurrent executions.
    #[derive(Default)]
    struct PeakTracker {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TaskExecutor for PeakTracker {
        async fn execute(&self, _task: &BackgroundTask) -> Result<TaskOutput, ExecutorError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(TaskOutput::new("done"))
        }
    }

    #[tokio::test]
    async fn test_run_until_idle_processes_in_priority_order() {
        let scheduler = manual_scheduler();
        for priority in [3, 1, 2] {
            scheduler
                .schedule(ScheduleRequest::new("agent_learning", priority))
                .await
                .unwrap();
        }
        let executor = Arc::new(ScriptedTaskExecutor::default());
        let pool = WorkerPool::new(scheduler.clone(), executor.clone())
            .with_params(SchedulerParams::default().with_concurrency(1));

        let summary = pool.run_until_idle().await.unwrap();
        assert_eq!(summary.completed, 3);

        let mut executed_priorities = Vec::new();
        for id in executor.executed() {
            executed_priorities.push(scheduler.task(&id).await.unwrap().priority);
        }
        assert_eq!(executed_priorities, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failures_go_through_retry_path() {
        let scheduler = manual_scheduler();
        let id = scheduler
            .schedule(ScheduleRequest::new("price_monitoring", 1).with_max_retries(1))
            .await
            .unwrap();
        let executor = Arc::new(ScriptedTaskExecutor::new(vec![Err(ExecutorError::Failed(
            "site unreachable".into(),
        ))]));
        let sink = Arc::new(RecordingSink::default());
        let pool = WorkerPool::new(scheduler.clone(), executor).with_telemetry(sink.clone());

        let summary = pool.run_until_idle().await.unwrap();
        assert_eq!(summary.retried, 1);
        assert_eq!(summary.completed, 0);

        let task = scheduler.task(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.retry_count, 1);
        assert!(task.last_error.unwrap().contains("site unreachable"));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert_eq!(records[0].task_type, TaskType::PriceMonitoring.as_str());
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_failure() {
        let scheduler = manual_scheduler();
        let id = scheduler
            .schedule(ScheduleRequest::new("research_monitoring", 1).with_max_retries(0))
            .await
            .unwrap();
        let executor =
            Arc::new(ScriptedTaskExecutor::default().with_delay(Duration::from_millis(500)));
        let pool = WorkerPool::new(scheduler.clone(), executor).with_params(
            SchedulerParams::default().with_task_timeout(Duration::from_millis(10)),
        );

        let summary = pool.run_until_idle().await.unwrap();
        assert_eq!(summary.failed, 1);

        let task = scheduler.task(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.last_error.unwrap().contains("timed out"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_limit_is_respected() {
        let scheduler = manual_scheduler();
        for _ in 0..6 {
            scheduler
                .schedule(ScheduleRequest::new("data_maintenance", 1))
                .await
                .unwrap();
        }
        let tracker = Arc::new(PeakTracker::default());
        let pool = WorkerPool::new(scheduler.clone(), tracker.clone())
            .with_params(SchedulerParams::default().with_concurrency(2));

        let summary = pool.run_until_idle().await.unwrap();
        assert_eq!(summary.completed, 6);
        assert!(tracker.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(scheduler.overview().await.unwrap().completed, 6);
    }

    #[tokio::test]
    async fn test_success_records_quality() {
        let scheduler = manual_scheduler();
        scheduler
            .schedule(ScheduleRequest::new("agent_learning", 1).with_agent("research"))
            .await
            .unwrap();
        let executor = Arc::new(ScriptedTaskExecutor::new(vec![Ok(
            TaskOutput::new("learned").with_quality(0.9)
        )]));
        let sink = Arc::new(RecordingSink::default());
        let pool = WorkerPool::new(scheduler.clone(), executor).with_telemetry(sink.clone());

        pool.run_until_idle().await.unwrap();

        let records = sink.records();
        assert_eq!(records[0].agent_id.as_str(), "research");
        assert_eq!(records[0].quality_score, Some(0.9));
        let stats = scheduler.stats(None).await.unwrap();
        assert_eq!(stats.avg_quality, Some(0.9));
    }

    #[tokio::test]
    async fn test_run_picks_up_new_work_and_stops_on_cancel() {
        let scheduler = Arc::new(Scheduler::new(Arc::new(MockRepository::default())));
        let executor = Arc::new(ScriptedTaskExecutor::default());
        let pool = Arc::new(
            WorkerPool::new(scheduler.clone(), executor).with_params(
                SchedulerParams::default().with_poll_interval(Duration::from_millis(10)),
            ),
        );
        let cancel = CancellationToken::new();

        let handle = {
            let pool = Arc::clone(&pool);
            let cancel = cancel.clone();
            tokio::spawn(async move { pool.run(cancel).await })
        };

        let id = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 1))
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while scheduler.task(&id).await.unwrap().status != TaskStatus::Completed {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("task should complete");

        cancel.cancel();
        let summary = handle.await.unwrap();
        assert_eq!(summary.completed, 1);
    }

    #[tokio::test]
    async fn test_idle_run_wakes_when_delayed_task_is_due() {
        let scheduler = Arc::new(Scheduler::new(Arc::new(MockRepository::default())));
        let id = scheduler
            .schedule(ScheduleRequest::new("agent_learning", 1).after(Duration::from_millis(100)))
            .await
            .unwrap();
        let params = SchedulerParams::default().with_poll_interval(Duration::from_secs(60));
        let pool = Arc::new(
            WorkerPool::new(scheduler.clone(), Arc::new(ScriptedTaskExecutor::default()))
                .with_params(params),
        );
        let cancel = CancellationToken::new();
        let handle = {
            let pool = Arc::clone(&pool);
            let cancel = cancel.clone();
            tokio::spawn(async move { pool.run(cancel).await })
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            while scheduler.task(&id).await.unwrap().status != TaskStatus::Completed {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("delayed task should run long before the poll interval");

        cancel.cancel();
        assert_eq!(handle.await.unwrap().completed, 1);
    }

    #[tokio::test]
    async fn test_drain_purges_expired_tasks() {
        let clock = Arc::new(ManualClock::new(t0()));
        let scheduler = Arc::new(
            Scheduler::new(Arc::new(MockRepository::default())).with_clock(clock.clone()),
        );
        let old = scheduler
            .schedule(ScheduleRequest::new("data_maintenance", 6))
            .await
            .unwrap();
        scheduler.dequeue().await.unwrap();
        scheduler.complete(&old, None).await.unwrap();

        clock.advance(chrono::Duration::days(8));
        let fresh = scheduler
            .schedule(ScheduleRequest::new("data_maintenance", 6))
            .await
            .unwrap();
        let pool = WorkerPool::new(scheduler.clone(), Arc::new(ScriptedTaskExecutor::default()));

        let summary = pool.run_until_idle().await.unwrap();
        assert_eq!(summary.completed, 1);
        assert!(scheduler.task(&old).await.is_err());
        assert_eq!(
            scheduler.task(&fresh).await.unwrap().status,
            TaskStatus::Completed
        );

        let keep_all = WorkerPool::new(scheduler.clone(), Arc::new(ScriptedTaskExecutor::default()))
            .with_params(SchedulerParams::default().with_retention(None));
        clock.advance(chrono::Duration::days(30));
        keep_all.run_until_idle().await.unwrap();
        assert_eq!(scheduler.overview().await.unwrap().completed, 1);
    }

    #[test]
    fn test_summary_processed() {
        let mut summary = WorkerSummary::default();
        summary.absorb(WorkOutcome::Completed);
        summary.absorb(WorkOutcome::Failed);
        summary.absorb(WorkOutcome::Unreported);
        assert_eq!(summary.processed(), 3);
    }
}
