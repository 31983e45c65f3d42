//! Domain error types

use std::time::Duration;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown agent type: {0}")]
    UnknownAgentType(String),

    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Unknown task status: {0}")]
    UnknownTaskStatus(String),

    #[error("Unknown complexity: {0}")]
    UnknownComplexity(String),

    #[error("Delay of {0:?} is beyond the one-year scheduling horizon")]
    DelayOutOfRange(Duration),

    #[error("Backoff base {base:?} exceeds its cap {max:?}")]
    BackoffRange { base: Duration, max: Duration },
}

impl DomainError {
    /// Check if this error was caused by an unrecognized task type
    pub fn is_unknown_task_type(&self) -> bool {
        matches!(self, DomainError::UnknownTaskType(_))
    }
}
