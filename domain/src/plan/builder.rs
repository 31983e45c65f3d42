//! Builds an [`ExecutionPlan`] from a [`Classification`].

use super::entities::{ExecutionPlan, PlanStep, StepRole};
use crate::classification::entities::{Classification, Complexity};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-step timeout ceilings keyed by complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutBudgets {
    pub low: Duration,
    pub medium: Duration,
    pub high: Duration,
}

impl Default for TimeoutBudgets {
    fn default() -> Self {
        Self {
            low: Duration::from_secs(30),
            medium: Duration::from_secs(60),
            high: Duration::from_secs(180),
        }
    }
}

impl TimeoutBudgets {
    pub fn for_complexity(&self, complexity: Complexity) -> Duration {
        match complexity {
            Complexity::Low => self.low,
            Complexity::Medium => self.medium,
            Complexity::High => self.high,
        }
    }
}

/// Turns classifications into plans. Never fails.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    budgets: TimeoutBudgets,
}

impl PlanBuilder {
    pub fn new(budgets: TimeoutBudgets) -> Self {
        Self { budgets }
    }

    /// One primary step, plus one supporting step per supporting agent when
    /// the classification needs multiple agents.
    pub fn build(&self, classification: &Classification) -> ExecutionPlan {
        let timeout_budget = self.budgets.for_complexity(classification.complexity);

        let mut steps = vec![PlanStep {
            agent: classification.primary_agent,
            role: StepRole::Primary,
            timeout_budget,
        }];

        if classification.needs_multiple_agents {
            steps.extend(
                classification
                    .supporting_agents
                    .iter()
                    .map(|agent| PlanStep {
                        agent: *agent,
                        role: StepRole::Supporting,
                        timeout_budget,
                    }),
            );
        }

        ExecutionPlan {
            plan_id: uuid::Uuid::new_v4().to_string(),
            request: classification.request.clone(),
            complexity: classification.complexity,
            confidence: classification.confidence,
            steps,
            deferred: classification.deferred.clone(),
            created_at: Utc::now(),
        }
    }
}
