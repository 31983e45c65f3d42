//! Keyword classifier: an interpreter over a [`Lexicon`].

use super::entities::{Classification, Complexity, DeferredWork};
use super::scores::AgentScores;
use crate::lexicon::matcher::NormalizedText;
use crate::lexicon::table::Lexicon;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tunables for the classifier that are not part of the lexicon data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Requests longer than this many characters are `high` complexity.
    pub high_complexity_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            high_complexity_chars: 200,
        }
    }
}

/// Routes a request to agents by weighted keyword scoring.
///
/// Classification is deterministic and never fails: text with no matching
/// keyword yields all-zero scores and the tie-break default agent.
///
/// # Example
///
/// ```
/// use dispatch_domain::{AgentType, TaskClassifier};
///
/// let classifier = TaskClassifier::default();
/// let c = classifier.classify("find best laptop deals");
/// assert_eq!(c.primary_agent, AgentType::Shopping);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskClassifier {
    lexicon: Arc<Lexicon>,
    config: ClassifierConfig,
}

impl TaskClassifier {
    pub fn new(lexicon: Arc<Lexicon>, config: ClassifierConfig) -> Self {
        Self { lexicon, config }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn classify(&self, request: &str) -> Classification {
        let text = NormalizedText::new(request);

        let mut scores = self.base_scores(&text);
        let fired = self.apply_overrides(&text, &mut scores);
        let complexity = self.complexity(&text);

        Classification::from_scores(request, scores, complexity, fired)
            .with_deferred(self.deferred_work(&text))
    }

    /// Accumulated lexicon weights before any override.
    pub fn base_scores(&self, text: &NormalizedText) -> AgentScores {
        let mut scores = AgentScores::new();
        for entry in &self.lexicon.entries {
            let weight = entry.weight_for(text);
            if weight > 0 {
                scores.add(entry.agent, weight);
            }
        }
        scores
    }

    /// Apply every matching override rule in declared order, returning the
    /// names of the rules that fired.
    pub fn apply_overrides(&self, text: &NormalizedText, scores: &mut AgentScores) -> Vec<String> {
        self.lexicon
            .overrides
            .iter()
            .filter(|rule| rule.matches(text))
            .map(|rule| {
                rule.apply(scores);
                rule.name.clone()
            })
            .collect()
    }

    pub fn complexity(&self, text: &NormalizedText) -> Complexity {
        if text.char_count() > self.config.high_complexity_chars
            || text.contains_any(&self.lexicon.high_complexity_qualifiers)
        {
            Complexity::High
        } else if text.contains_any(&self.lexicon.low_complexity_qualifiers) {
            Complexity::Low
        } else {
            Complexity::Medium
        }
    }

    fn deferred_work(&self, text: &NormalizedText) -> Option<DeferredWork> {
        self.lexicon
            .deferrals
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| DeferredWork {
                rule: rule.name.clone(),
                task_type: rule.task_type,
                priority: rule.priority,
            })
    }
}
