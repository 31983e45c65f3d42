//! Domain layer for agent-dispatch
//!
//! This crate contains the core routing logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Routing
//!
//! A free-form request is scored against a static [`Lexicon`] by the
//! [`TaskClassifier`], producing a [`Classification`]. Ordered override rules
//! resolve phrasings that plain keyword accumulation gets wrong.
//!
//! ## Planning
//!
//! The [`PlanBuilder`] turns a classification into an [`ExecutionPlan`]: one
//! primary step, plus supporting steps for high-complexity requests.
//!
//! ## Background Tasks
//!
//! Deferred work is a [`BackgroundTask`] moving through
//! `pending → running → completed | failed`, persisted behind a
//! [`TaskRepository`].

pub mod agent;
pub mod classification;
pub mod config;
pub mod core;
pub mod lexicon;
pub mod plan;
pub mod task;

// Re-export commonly used types
pub use agent::agent_type::AgentType;
pub use classification::{
    classifier::{ClassifierConfig, TaskClassifier},
    entities::{Classification, Complexity, DeferredWork, MAX_SUPPORTING_AGENTS},
    scores::AgentScores,
};
pub use config::OutputFormat;
pub use core::{error::DomainError, string::truncate};
pub use lexicon::{
    entries::{DeferralRule, LexiconEntry, OverrideRule},
    matcher::NormalizedText,
    table::{LEXICON_VERSION, Lexicon},
};
pub use plan::{
    builder::{PlanBuilder, TimeoutBudgets},
    entities::{ExecutionPlan, PlanStep, StepRole},
};
pub use task::{
    entities::{
        BackgroundTask, DEFAULT_MAX_RETRIES, FailOutcome, InvalidTransition, TaskStatus, TaskType,
    },
    repository::{RepositoryError, TaskRepository},
    retry::{MAX_SCHEDULE_DELAY, RetryPolicy},
    stats::{QueueOverview, TaskStats},
    value_objects::{AgentId, TaskId},
};
