//! Lexicon row types: weighted keywords, override rules and deferral rules.

use super::matcher::NormalizedText;
use crate::agent::agent_type::AgentType;
use crate::classification::scores::AgentScores;
use crate::task::entities::TaskType;
use serde::{Deserialize, Serialize};

/// A weighted keyword for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub agent: AgentType,
    pub phrase: String,
    pub base_weight: u32,
    /// Added on top of `base_weight` when any qualifier co-occurs.
    #[serde(default)]
    pub boost_weight: u32,
    #[serde(default)]
    pub qualifiers: Vec<String>,
}

impl LexiconEntry {
    pub fn new(agent: AgentType, phrase: impl Into<String>, base_weight: u32) -> Self {
        Self {
            agent,
            phrase: phrase.into(),
            base_weight,
            boost_weight: 0,
            qualifiers: Vec::new(),
        }
    }

    pub fn with_boost<S: Into<String>>(
        mut self,
        boost_weight: u32,
        qualifiers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.boost_weight = boost_weight;
        self.qualifiers = qualifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Weight this entry contributes to `text` (0 when the phrase is absent).
    pub fn weight_for(&self, text: &NormalizedText) -> u32 {
        if !text.contains_phrase(&self.phrase) {
            return 0;
        }
        if self.boost_weight > 0 && text.contains_any(&self.qualifiers) {
            self.base_weight + self.boost_weight
        } else {
            self.base_weight
        }
    }
}

/// A disambiguation rule applied after base scoring.
///
/// Fires when every trigger phrase and at least one context phrase occur.
/// A rule with no context phrases needs only its triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub name: String,
    pub trigger_phrases: Vec<String>,
    pub context_phrases: Vec<String>,
    pub boosted_agent: AgentType,
    pub boosted_score: u32,
    pub suppressed_agent: AgentType,
    pub suppressed_score: u32,
}

impl OverrideRule {
    pub fn matches(&self, text: &NormalizedText) -> bool {
        !self.trigger_phrases.is_empty()
            && text.contains_all(&self.trigger_phrases)
            && (self.context_phrases.is_empty() || text.contains_any(&self.context_phrases))
    }

    /// Raise the boosted agent and lower the suppressed one.
    ///
    /// Only `max`/`min` clamps are used, so applying a rule again leaves the
    /// scores unchanged.
    pub fn apply(&self, scores: &mut AgentScores) {
        scores.raise_to(self.boosted_agent, self.boosted_score);
        scores.lower_to(self.suppressed_agent, self.suppressed_score);
    }
}

/// Maps request phrasings to background work that should be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferralRule {
    pub name: String,
    /// Any one of these phrases triggers the rule.
    pub phrases: Vec<String>,
    pub task_type: TaskType,
    pub priority: i32,
}

impl DeferralRule {
    pub fn matches(&self, text: &NormalizedText) -> bool {
        text.contains_any(&self.phrases)
    }
}
