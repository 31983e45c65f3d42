//! Background task domain.
//!
//! - [`entities::BackgroundTask`] — persisted unit of deferred work and its lifecycle
//! - [`value_objects`] — task and agent identifiers
//! - [`retry::RetryPolicy`] — exponential backoff between attempts
//! - [`stats`] — aggregates over finished tasks
//! - [`repository::TaskRepository`] — trait for task persistence

pub mod entities;
pub mod repository;
pub mod retry;
pub mod stats;
pub mod value_objects;
