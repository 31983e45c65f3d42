//! Raw per-agent scores.

use crate::agent::agent_type::AgentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated keyword score for every agent.
///
/// Scores are raw integers, never normalized. Every [`AgentType`] always has
/// an entry (zero when nothing matched).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentScores(BTreeMap<AgentType, u32>);

impl Default for AgentScores {
    fn default() -> Self {
        Self(AgentType::ALL.iter().map(|agent| (*agent, 0)).collect())
    }
}

impl AgentScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, agent: AgentType) -> u32 {
        self.0.get(&agent).copied().unwrap_or(0)
    }

    pub fn add(&mut self, agent: AgentType, weight: u32) {
        let score = self.0.entry(agent).or_insert(0);
        *score = score.saturating_add(weight);
    }

    /// Raise a score to at least `floor`; never lowers it.
    pub fn raise_to(&mut self, agent: AgentType, floor: u32) {
        let score = self.0.entry(agent).or_insert(0);
        *score = (*score).max(floor);
    }

    /// Lower a score to at most `ceiling`; never raises it.
    pub fn lower_to(&mut self, agent: AgentType, ceiling: u32) {
        let score = self.0.entry(agent).or_insert(0);
        *score = (*score).min(ceiling);
    }

    pub fn is_all_zero(&self) -> bool {
        self.0.values().all(|score| *score == 0)
    }

    /// Agents sorted by descending score, ties broken by [`AgentType::ALL`] order.
    pub fn ranked(&self) -> Vec<(AgentType, u32)> {
        let mut ranked: Vec<(AgentType, u32)> = AgentType::ALL
            .iter()
            .map(|agent| (*agent, self.get(*agent)))
            .collect();
        // Stable sort keeps the tie-break order for equal scores.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Highest-scoring agent. All-zero scores resolve to the first agent in
    /// the tie-break order.
    pub fn argmax(&self) -> AgentType {
        self.ranked()
            .first()
            .map(|(agent, _)| *agent)
            .unwrap_or(AgentType::ALL[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentType, u32)> + '_ {
        self.0.iter().map(|(agent, score)| (*agent, *score))
    }
}
