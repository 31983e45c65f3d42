//! Execution plan domain.
//!
//! - [`entities::ExecutionPlan`] — ordered agent steps derived from a classification
//! - [`builder::PlanBuilder`] — classification → plan, with complexity-keyed timeouts

pub mod builder;
pub mod entities;
