//! Port definitions (interfaces for external adapters)

pub mod agent_executor;
pub mod clock;
pub mod performance_sink;
pub mod task_executor;
