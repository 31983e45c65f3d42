//! Lexicon store: the static data the classifier interprets.
//!
//! - [`entries::LexiconEntry`] — weighted keyword for one agent
//! - [`entries::OverrideRule`] — ordered disambiguation rule
//! - [`entries::DeferralRule`] — phrasing that spawns background work
//! - [`table::Lexicon`] — the versioned table holding all of the above
//! - [`matcher::NormalizedText`] — token-level phrase matching

pub mod entries;
pub mod matcher;
pub mod table;
