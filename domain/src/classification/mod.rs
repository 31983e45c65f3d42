//! Request classification.
//!
//! - [`classifier::TaskClassifier`] — scores a request against the lexicon
//! - [`entities::Classification`] — the routing decision
//! - [`scores::AgentScores`] — raw per-agent scores

pub mod classifier;
pub mod entities;
pub mod scores;
