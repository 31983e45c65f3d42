//! Executor adapters for the agent and task executor ports.

mod dry_run;

pub use dry_run::DryRunExecutor;
