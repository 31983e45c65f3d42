//! Exponential backoff for failed tasks.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest offset from "now" a task may be scheduled or retried at.
pub const MAX_SCHEDULE_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Backoff schedule: `base * 2^retry_count`, capped at `max_delay`.
///
/// `base_delay <= max_delay <= MAX_SCHEDULE_DELAY` holds for every value,
/// including deserialized ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRetryPolicy")]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
}

#[derive(Deserialize)]
struct RawRetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
}

impl TryFrom<RawRetryPolicy> for RetryPolicy {
    type Error = DomainError;

    fn try_from(raw: RawRetryPolicy) -> Result<Self, Self::Error> {
        Self::new(raw.base_delay, raw.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Result<Self, DomainError> {
        if max_delay > MAX_SCHEDULE_DELAY {
            return Err(DomainError::DelayOutOfRange(max_delay));
        }
        if base_delay > max_delay {
            return Err(DomainError::BackoffRange {
                base: base_delay,
                max: max_delay,
            });
        }
        Ok(Self {
            base_delay,
            max_delay,
        })
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Delay before the attempt following retry number `retry_count`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let factor = 2u32.checked_pow(retry_count).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// [`backoff`](Self::backoff) as a calendar offset.
    pub fn delay_for(&self, retry_count: u32) -> chrono::Duration {
        // Bounded by MAX_SCHEDULE_DELAY, so the millisecond count fits.
        chrono::Duration::milliseconds(self.backoff(retry_count).as_millis() as i64)
    }
}
