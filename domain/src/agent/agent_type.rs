//! The six specialized agents a request can be routed to.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Specialized task-execution agent.
///
/// The declaration order of [`AgentType::ALL`] is the routing tie-break
/// order: when two agents score the same, the one listed first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Information gathering, research, data collection
    Research,
    /// Website navigation, URL handling, browsing
    Navigation,
    /// Product research, price comparison, deals
    Shopping,
    /// Email composition, messaging, forms
    Communication,
    /// Workflow creation, task automation, processes
    Automation,
    /// Content analysis, data insights, evaluation
    Analysis,
}

impl AgentType {
    /// All agents in tie-break priority order.
    pub const ALL: [AgentType; 6] = [
        AgentType::Research,
        AgentType::Analysis,
        AgentType::Shopping,
        AgentType::Navigation,
        AgentType::Communication,
        AgentType::Automation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Research => "research",
            AgentType::Navigation => "navigation",
            AgentType::Shopping => "shopping",
            AgentType::Communication => "communication",
            AgentType::Automation => "automation",
            AgentType::Analysis => "analysis",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::Research => "Research Agent",
            AgentType::Navigation => "Navigation Agent",
            AgentType::Shopping => "Shopping Agent",
            AgentType::Communication => "Communication Agent",
            AgentType::Automation => "Automation Agent",
            AgentType::Analysis => "Analysis Agent",
        }
    }

    /// Position in the tie-break order (0 = preferred).
    pub fn tie_break_rank(&self) -> usize {
        Self::ALL
            .iter()
            .position(|agent| agent == self)
            .unwrap_or(Self::ALL.len())
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research" => Ok(AgentType::Research),
            "navigation" => Ok(AgentType::Navigation),
            "shopping" => Ok(AgentType::Shopping),
            "communication" => Ok(AgentType::Communication),
            "automation" => Ok(AgentType::Automation),
            "analysis" => Ok(AgentType::Analysis),
            _ => Err(DomainError::UnknownAgentType(s.to_string())),
        }
    }
}
