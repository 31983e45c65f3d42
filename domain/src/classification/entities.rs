//! Classification result types

use super::scores::AgentScores;
use crate::agent::agent_type::AgentType;
use crate::core::error::DomainError;
use crate::task::entities::TaskType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complexity tier of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            _ => Err(DomainError::UnknownComplexity(s.to_string())),
        }
    }
}

/// Background work a request asks for, detected by a deferral rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredWork {
    /// Name of the deferral rule that matched
    pub rule: String,
    pub task_type: TaskType,
    pub priority: i32,
}

/// The routing decision for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The request as submitted
    pub request: String,
    pub scores: AgentScores,
    pub primary_agent: AgentType,
    /// At most two, by descending score, each with a positive score
    pub supporting_agents: Vec<AgentType>,
    pub complexity: Complexity,
    /// Score of the primary agent
    pub confidence: u32,
    pub needs_multiple_agents: bool,
    /// Names of override rules that fired, in application order
    pub fired_overrides: Vec<String>,
    pub deferred: Option<DeferredWork>,
}

impl Classification {
    /// Assemble a classification from final scores, deriving every
    /// dependent field.
    pub fn from_scores(
        request: impl Into<String>,
        scores: AgentScores,
        complexity: Complexity,
        fired_overrides: Vec<String>,
    ) -> Self {
        let primary_agent = scores.argmax();
        let supporting_agents: Vec<AgentType> = scores
            .ranked()
            .into_iter()
            .filter(|(agent, score)| *agent != primary_agent && *score > 0)
            .take(MAX_SUPPORTING_AGENTS)
            .map(|(agent, _)| agent)
            .collect();
        let needs_multiple_agents =
            !supporting_agents.is_empty() && complexity == Complexity::High;

        Self {
            request: request.into(),
            confidence: scores.get(primary_agent),
            scores,
            primary_agent,
            supporting_agents,
            complexity,
            needs_multiple_agents,
            fired_overrides,
            deferred: None,
        }
    }

    pub fn with_deferred(mut self, deferred: Option<DeferredWork>) -> Self {
        self.deferred = deferred;
        self
    }

    /// No keyword matched; the primary agent is the tie-break default.
    pub fn is_indeterminate(&self) -> bool {
        self.scores.is_all_zero()
    }
}

/// Upper bound on supporting agents per request.
pub const MAX_SUPPORTING_AGENTS: usize = 2;
