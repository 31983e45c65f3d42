//! Scheduler parameters — worker loop control.
//!
//! [`SchedulerParams`] groups the static parameters that control the
//! [`Scheduler`](crate::use_cases::scheduler::Scheduler) and the
//! [`WorkerPool`](crate::use_cases::worker_pool::WorkerPool).
//! These are application-layer concerns, not domain policy.

use dispatch_domain::{DEFAULT_MAX_RETRIES, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker loop control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerParams {
    /// Maximum number of tasks executing at once.
    pub concurrency: usize,
    /// Longest an idle worker waits before polling the store again.
    pub poll_interval: Duration,
    /// Executor deadline per task; expiry is reported as a failure.
    pub task_timeout: Duration,
    /// Backoff between attempts.
    pub retry_policy: RetryPolicy,
    /// `max_retries` for tasks scheduled without an explicit value.
    pub default_max_retries: u32,
    /// How long finished tasks are kept; `None` keeps them forever.
    pub retention: Option<Duration>,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            concurrency: 4,
            poll_interval: Duration::from_secs(1),
            task_timeout: Duration::from_secs(300),
            retry_policy: RetryPolicy::default(),
            default_max_retries: DEFAULT_MAX_RETRIES,
            retention: Some(Duration::from_secs(7 * 24 * 3600)),
        }
    }
}

impl SchedulerParams {
    // ==================== Builder Methods ====================

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_default_max_retries(mut self, max: u32) -> Self {
        self.default_max_retries = max;
        self
    }

    pub fn with_retention(mut self, retention: Option<Duration>) -> Self {
        self.retention = retention;
        self
    }
}
