//! Plan configuration from TOML (`[plan]` section)

use dispatch_domain::TimeoutBudgets;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-complexity step timeout budgets, in seconds
///
/// # Example
///
/// ```toml
/// [plan]
/// low_timeout_secs = 30
/// medium_timeout_secs = 60
/// high_timeout_secs = 180
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePlanConfig {
    pub low_timeout_secs: u64,
    pub medium_timeout_secs: u64,
    pub high_timeout_secs: u64,
}

impl Default for FilePlanConfig {
    fn default() -> Self {
        let budgets = TimeoutBudgets::default();
        Self {
            low_timeout_secs: budgets.low.as_secs(),
            medium_timeout_secs: budgets.medium.as_secs(),
            high_timeout_secs: budgets.high.as_secs(),
        }
    }
}

impl FilePlanConfig {
    pub fn to_timeout_budgets(&self) -> TimeoutBudgets {
        TimeoutBudgets {
            low: Duration::from_secs(self.low_timeout_secs),
            medium: Duration::from_secs(self.medium_timeout_secs),
            high: Duration::from_secs(self.high_timeout_secs),
        }
    }
}
