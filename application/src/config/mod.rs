//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`RoutingParams`] — classifier threshold and per-complexity timeout budgets
//! - [`SchedulerParams`] — worker concurrency, polling, timeouts and retry policy

pub mod routing_params;
pub mod scheduler_params;

pub use routing_params::RoutingParams;
pub use scheduler_params::SchedulerParams;
