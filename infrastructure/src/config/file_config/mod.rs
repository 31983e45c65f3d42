//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod classifier;
mod output;
mod plan;
mod scheduler;
mod storage;
mod telemetry;

pub use classifier::FileClassifierConfig;
pub use output::FileOutputConfig;
pub use plan::FilePlanConfig;
pub use scheduler::FileSchedulerConfig;
pub use storage::{FileStorageConfig, StorageBackend};
pub use telemetry::FileTelemetryConfig;

use dispatch_application::RoutingParams;
use dispatch_domain::MAX_SCHEDULE_DELAY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("scheduler.concurrency cannot be 0")]
    ZeroConcurrency,

    #[error("scheduler.poll_interval_ms cannot be 0")]
    ZeroPollInterval,

    #[error("scheduler.task_timeout_secs cannot be 0")]
    ZeroTaskTimeout,

    #[error("scheduler.backoff_base_secs ({base}) exceeds backoff_max_secs ({max})")]
    BackoffRange { base: u64, max: u64 },

    #[error("scheduler.backoff_max_secs ({0}) is beyond the one-year scheduling horizon")]
    BackoffTooLong(u64),

    #[error("storage.lease_ttl_secs ({lease}) must exceed scheduler.task_timeout_secs ({task})")]
    LeaseShorterThanTask { lease: u64, task: u64 },

    #[error("plan timeouts must be non-zero and ascending (low <= medium <= high)")]
    PlanBudgetOrder,

    #[error("classifier.high_complexity_chars cannot be 0")]
    ZeroComplexityThreshold,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Classification tunables
    pub classifier: FileClassifierConfig,
    /// Step timeout budgets
    pub plan: FilePlanConfig,
    /// Worker loop and retry policy
    pub scheduler: FileSchedulerConfig,
    /// Task store
    pub storage: FileStorageConfig,
    /// Performance records
    pub telemetry: FileTelemetryConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        let scheduler = &self.scheduler;
        if scheduler.concurrency == 0 {
            errors.push(ConfigValidationError::ZeroConcurrency);
        }
        if scheduler.poll_interval_ms == 0 {
            errors.push(ConfigValidationError::ZeroPollInterval);
        }
        if scheduler.task_timeout_secs == 0 {
            errors.push(ConfigValidationError::ZeroTaskTimeout);
        }
        if scheduler.backoff_base_secs > scheduler.backoff_max_secs {
            errors.push(ConfigValidationError::BackoffRange {
                base: scheduler.backoff_base_secs,
                max: scheduler.backoff_max_secs,
            });
        }
        if scheduler.backoff_max_secs > MAX_SCHEDULE_DELAY.as_secs() {
            errors.push(ConfigValidationError::BackoffTooLong(scheduler.backoff_max_secs));
        }
        if self.storage.backend == StorageBackend::File
            && self.storage.lease_ttl_secs <= scheduler.task_timeout_secs
        {
            errors.push(ConfigValidationError::LeaseShorterThanTask {
                lease: self.storage.lease_ttl_secs,
                task: scheduler.task_timeout_secs,
            });
        }

        let plan = &self.plan;
        if plan.low_timeout_secs == 0
            || plan.low_timeout_secs > plan.medium_timeout_secs
            || plan.medium_timeout_secs > plan.high_timeout_secs
        {
            errors.push(ConfigValidationError::PlanBudgetOrder);
        }

        if self.classifier.high_complexity_chars == 0 {
            errors.push(ConfigValidationError::ZeroComplexityThreshold);
        }

        errors
    }

    pub fn routing_params(&self) -> RoutingParams {
        RoutingParams {
            classifier: self.classifier.to_classifier_config(),
            budgets: self.plan.to_timeout_budgets(),
        }
    }
}
