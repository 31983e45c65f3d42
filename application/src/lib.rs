//! Application layer for agent-dispatch
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{RoutingParams, SchedulerParams};
pub use ports::{
    agent_executor::{AgentExecutor, AgentOutput, ExecutorError},
    clock::{Clock, ManualClock, SystemClock},
    performance_sink::{NoTelemetry, PerformanceRecord, PerformanceSink},
    task_executor::{TaskExecutor, TaskOutput},
};
pub use use_cases::classify_and_plan::{ClassifyAndPlanUseCase, RoutedRequest};
pub use use_cases::dispatch_plan::{DispatchPlanUseCase, DispatchReport, StepReport};
pub use use_cases::scheduler::{ScheduleAt, ScheduleRequest, Scheduler, SchedulerError};
pub use use_cases::worker_pool::{WorkOutcome, WorkerPool, WorkerSummary};
