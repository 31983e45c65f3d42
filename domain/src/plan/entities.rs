//! Execution plan entities

use crate::agent::agent_type::AgentType;
use crate::classification::entities::{Complexity, DeferredWork};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Role of an agent within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRole {
    Primary,
    Supporting,
}

impl StepRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepRole::Primary => "primary",
            StepRole::Supporting => "supporting",
        }
    }
}

impl std::fmt::Display for StepRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One agent invocation.
///
/// `timeout_budget` is advisory: the agent executor enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub agent: AgentType,
    pub role: StepRole,
    pub timeout_budget: Duration,
}

/// Ordered agent steps for one request.
///
/// The first step is always the primary agent; supporting steps follow and
/// may run concurrently with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub plan_id: String,
    pub request: String,
    pub complexity: Complexity,
    pub confidence: u32,
    pub steps: Vec<PlanStep>,
    /// Background work to schedule alongside the immediate steps
    pub deferred: Option<DeferredWork>,
    pub created_at: DateTime<Utc>,
}

impl ExecutionPlan {
    pub fn primary(&self) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.role == StepRole::Primary)
    }

    pub fn supporting(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter().filter(|s| s.role == StepRole::Supporting)
    }

    pub fn is_multi_agent(&self) -> bool {
        self.steps.len() > 1
    }

    /// Sum of all step budgets, the worst case when steps run one by one.
    pub fn total_budget(&self) -> Duration {
        self.steps.iter().map(|s| s.timeout_budget).sum()
    }
}
