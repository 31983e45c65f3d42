//! Use cases (application services)

pub mod classify_and_plan;
pub mod dispatch_plan;
pub mod scheduler;
pub mod worker_pool;
