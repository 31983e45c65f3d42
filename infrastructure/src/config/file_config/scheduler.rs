//! Scheduler configuration from TOML (`[scheduler]` section)

use dispatch_application::SchedulerParams;
use dispatch_domain::{DomainError, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw scheduler configuration from TOML
///
/// # Example
///
/// ```toml
/// [scheduler]
/// concurrency = 4
/// poll_interval_ms = 1000
/// task_timeout_secs = 300
/// max_retries = 3
/// backoff_base_secs = 5
/// backoff_max_secs = 3600
/// retention_hours = 168    # 0 keeps finished tasks forever
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSchedulerConfig {
    pub concurrency: usize,
    pub poll_interval_ms: u64,
    pub task_timeout_secs: u64,
    /// Default for tasks scheduled without an explicit value
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    pub backoff_max_secs: u64,
    /// Finished tasks older than this are purged by workers
    pub retention_hours: u64,
}

impl Default for FileSchedulerConfig {
    fn default() -> Self {
        let params = SchedulerParams::default();
        Self {
            concurrency: params.concurrency,
            poll_interval_ms: params.poll_interval.as_millis() as u64,
            task_timeout_secs: params.task_timeout.as_secs(),
            max_retries: params.default_max_retries,
            backoff_base_secs: params.retry_policy.base_delay().as_secs(),
            backoff_max_secs: params.retry_policy.max_delay().as_secs(),
            retention_hours: params.retention.map_or(0, |r| r.as_secs() / 3600),
        }
    }
}

impl FileSchedulerConfig {
    /// Fails only on a backoff range that [`FileConfig::validate`] also
    /// reports.
    ///
    /// [`FileConfig::validate`]: super::FileConfig::validate
    pub fn to_scheduler_params(&self) -> Result<SchedulerParams, DomainError> {
        let retry_policy = RetryPolicy::new(
            Duration::from_secs(self.backoff_base_secs),
            Duration::from_secs(self.backoff_max_secs),
        )?;
        let retention = (self.retention_hours > 0)
            .then(|| Duration::from_secs(self.retention_hours.saturating_mul(3600)));

        Ok(SchedulerParams::default()
            .with_concurrency(self.concurrency)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_task_timeout(Duration::from_secs(self.task_timeout_secs))
            .with_default_max_retries(self.max_retries)
            .with_retry_policy(retry_policy)
            .with_retention(retention))
    }
}
