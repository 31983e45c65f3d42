//! The built-in lexicon data.

use super::entries::{DeferralRule, LexiconEntry, OverrideRule};
use crate::agent::agent_type::AgentType;
use crate::task::entities::TaskType;
use serde::{Deserialize, Serialize};

/// Version tag of the built-in tables. Bump when weights or rules change.
pub const LEXICON_VERSION: &str = "2025.1";

/// Product nouns that qualify "best"/"top" as a shopping request.
const PRODUCT_NOUNS: &[&str] = &[
    "laptop",
    "phone",
    "smartphone",
    "headphone",
    "camera",
    "tv",
    "tablet",
    "shoe",
    "product",
    "deal",
    "price",
];

/// `(agent, phrase, base_weight)` rows without co-occurrence boosts.
const KEYWORDS: &[(AgentType, &str, u32)] = &[
    (AgentType::Research, "research", 3),
    (AgentType::Research, "investigate", 3),
    (AgentType::Research, "find", 2),
    (AgentType::Research, "search", 2),
    (AgentType::Research, "study", 2),
    (AgentType::Research, "development", 2),
    (AgentType::Research, "what is", 2),
    (AgentType::Research, "latest", 1),
    (AgentType::Research, "learn", 1),
    (AgentType::Research, "how to", 1),
    (AgentType::Research, "information", 1),
    (AgentType::Research, "source", 1),
    (AgentType::Research, "news", 1),
    (AgentType::Navigation, "navigate", 3),
    (AgentType::Navigation, "go to", 3),
    (AgentType::Navigation, "visit", 2),
    (AgentType::Navigation, "open", 2),
    (AgentType::Navigation, "website", 2),
    (AgentType::Navigation, "url", 2),
    (AgentType::Navigation, "tab", 2),
    (AgentType::Navigation, "browse", 2),
    (AgentType::Navigation, "page", 1),
    (AgentType::Shopping, "buy", 3),
    (AgentType::Shopping, "shop", 3),
    (AgentType::Shopping, "shopping", 3),
    (AgentType::Shopping, "purchase", 3),
    (AgentType::Shopping, "price", 2),
    (AgentType::Shopping, "deal", 2),
    (AgentType::Shopping, "product", 2),
    (AgentType::Shopping, "cheapest", 2),
    (AgentType::Shopping, "discount", 2),
    (AgentType::Shopping, "coupon", 2),
    (AgentType::Shopping, "retailer", 2),
    (AgentType::Shopping, "laptop", 1),
    (AgentType::Communication, "email", 3),
    (AgentType::Communication, "compose", 3),
    (AgentType::Communication, "write", 2),
    (AgentType::Communication, "message", 2),
    (AgentType::Communication, "letter", 2),
    (AgentType::Communication, "reply", 2),
    (AgentType::Communication, "draft", 2),
    (AgentType::Communication, "send", 1),
    (AgentType::Communication, "professional", 1),
    (AgentType::Communication, "meeting", 1),
    (AgentType::Automation, "automate", 3),
    (AgentType::Automation, "automation", 3),
    (AgentType::Automation, "workflow", 3),
    (AgentType::Automation, "schedule", 2),
    (AgentType::Automation, "recurring", 2),
    (AgentType::Automation, "task", 1),
    (AgentType::Automation, "daily", 1),
    (AgentType::Automation, "routine", 1),
    (AgentType::Automation, "process", 1),
    (AgentType::Analysis, "analyze", 3),
    (AgentType::Analysis, "analyse", 3),
    (AgentType::Analysis, "analysis", 3),
    (AgentType::Analysis, "review", 2),
    (AgentType::Analysis, "examine", 2),
    (AgentType::Analysis, "evaluate", 2),
    (AgentType::Analysis, "insight", 2),
    (AgentType::Analysis, "summarize", 2),
    (AgentType::Analysis, "content", 1),
    (AgentType::Analysis, "data", 1),
    (AgentType::Analysis, "compare", 1),
    (AgentType::Analysis, "trend", 1),
];

const HIGH_COMPLEXITY_QUALIFIERS: &[&str] =
    &["comprehensive", "detailed", "deep", "thorough", "in-depth"];

const LOW_COMPLEXITY_QUALIFIERS: &[&str] = &["simple", "quick", "quickly", "brief"];

/// Keyword tables, override rules and deferral rules used by the classifier.
///
/// The built-in table is returned by [`Lexicon::default`]. A lexicon can also
/// be deserialized from a configuration resource; it is never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    pub version: String,
    pub entries: Vec<LexiconEntry>,
    /// Applied in declared order.
    pub overrides: Vec<OverrideRule>,
    /// First matching rule wins.
    #[serde(default)]
    pub deferrals: Vec<DeferralRule>,
    pub high_complexity_qualifiers: Vec<String>,
    pub low_complexity_qualifiers: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let mut entries: Vec<LexiconEntry> = KEYWORDS
            .iter()
            .map(|(agent, phrase, weight)| LexiconEntry::new(*agent, *phrase, *weight))
            .collect();
        entries.push(
            LexiconEntry::new(AgentType::Shopping, "best", 1)
                .with_boost(2, PRODUCT_NOUNS.iter().copied()),
        );
        entries.push(
            LexiconEntry::new(AgentType::Shopping, "top rated", 1)
                .with_boost(2, PRODUCT_NOUNS.iter().copied()),
        );

        Self {
            version: LEXICON_VERSION.to_string(),
            entries,
            overrides: default_overrides(),
            deferrals: default_deferrals(),
            high_complexity_qualifiers: to_strings(HIGH_COMPLEXITY_QUALIFIERS),
            low_complexity_qualifiers: to_strings(LOW_COMPLEXITY_QUALIFIERS),
        }
    }
}

impl Lexicon {
    /// Entries that score for `agent`.
    pub fn entries_for(&self, agent: AgentType) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.iter().filter(move |e| e.agent == agent)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_overrides() -> Vec<OverrideRule> {
    vec![
        // "find the best laptop deals" reads as research without this rule.
        OverrideRule {
            name: "product-comparison".to_string(),
            trigger_phrases: to_strings(&["find", "best"]),
            context_phrases: to_strings(PRODUCT_NOUNS),
            boosted_agent: AgentType::Shopping,
            boosted_score: 10,
            suppressed_agent: AgentType::Research,
            suppressed_score: 1,
        },
        OverrideRule {
            name: "price-comparison".to_string(),
            trigger_phrases: to_strings(&["compare"]),
            context_phrases: to_strings(&["price", "deal", "cheapest"]),
            boosted_agent: AgentType::Shopping,
            boosted_score: 10,
            suppressed_agent: AgentType::Analysis,
            suppressed_score: 1,
        },
        // "analyze this page" reads as navigation without this rule.
        OverrideRule {
            name: "content-inspection".to_string(),
            trigger_phrases: to_strings(&["analyze"]),
            context_phrases: to_strings(&["page", "content", "this"]),
            boosted_agent: AgentType::Analysis,
            boosted_score: 10,
            suppressed_agent: AgentType::Navigation,
            suppressed_score: 0,
        },
    ]
}

fn default_deferrals() -> Vec<DeferralRule> {
    vec![
        DeferralRule {
            name: "price-watch".to_string(),
            phrases: to_strings(&[
                "price alert",
                "price drop",
                "track price",
                "watch price",
                "monitor price",
            ]),
            task_type: TaskType::PriceMonitoring,
            priority: 3,
        },
        DeferralRule {
            name: "topic-watch".to_string(),
            phrases: to_strings(&[
                "monitor",
                "keep track",
                "stay updated",
                "keep me updated",
                "follow development",
            ]),
            task_type: TaskType::ResearchMonitoring,
            priority: 4,
        },
        DeferralRule {
            name: "autonomous-goal".to_string(),
            phrases: to_strings(&["goal", "organize", "long term plan"]),
            task_type: TaskType::AutonomousGoalExecution,
            priority: 2,
        },
        DeferralRule {
            name: "preference-learning".to_string(),
            phrases: to_strings(&["remember my preference", "learn my preference"]),
            task_type: TaskType::AgentLearning,
            priority: 5,
        },
        DeferralRule {
            name: "history-cleanup".to_string(),
            phrases: to_strings(&["clean up history", "clear history", "cleanup"]),
            task_type: TaskType::DataMaintenance,
            priority: 6,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_covers_every_agent() {
        let lexicon = Lexicon::default();
        for agent in AgentType::ALL {
            assert!(lexicon.entries_for(agent).count() > 0, "no entries for {agent}");
        }
    }

    #[test]
    fn test_default_override_order() {
        let names: Vec<_> = Lexicon::default()
            .overrides
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(
            names,
            vec!["product-comparison", "price-comparison", "content-inspection"]
        );
    }

    #[test]
    fn test_default_phrases_are_unique_per_agent() {
        let lexicon = Lexicon::default();
        let mut seen = std::collections::HashSet::new();
        for entry in &lexicon.entries {
            assert!(
                seen.insert((entry.agent, entry.phrase.clone())),
                "duplicate entry {} for {}",
                entry.phrase,
                entry.agent
            );
        }
    }

    #[test]
    fn test_lexicon_serde_roundtrip_preserves_version() {
        let lexicon = Lexicon::default();
        let json = serde_json::to_string(&lexicon).unwrap();
        let parsed: Lexicon = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, LEXICON_VERSION);
        assert_eq!(parsed, lexicon);
    }
}
