//! Routing parameters — classifier and plan builder tunables.

use dispatch_domain::{ClassifierConfig, Lexicon, PlanBuilder, TaskClassifier, TimeoutBudgets};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Settings for classification and planning.
///
/// The lexicon itself is data and travels separately; these are the knobs
/// around it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingParams {
    pub classifier: ClassifierConfig,
    pub budgets: TimeoutBudgets,
}

impl RoutingParams {
    pub fn with_high_complexity_chars(mut self, chars: usize) -> Self {
        self.classifier.high_complexity_chars = chars;
        self
    }

    pub fn with_budgets(mut self, budgets: TimeoutBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn classifier_for(&self, lexicon: Arc<Lexicon>) -> TaskClassifier {
        TaskClassifier::new(lexicon, self.classifier)
    }

    pub fn plan_builder(&self) -> PlanBuilder {
        PlanBuilder::new(self.budgets)
    }
}
