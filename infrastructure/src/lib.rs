//! Infrastructure layer for agent-dispatch
//!
//! This crate contains adapters that implement the ports defined in the
//! application and domain layers: task storage, telemetry, executors, and
//! configuration file loading.

pub mod config;
pub mod executor;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileOutputConfig, LexiconLoadError,
    StorageBackend, load_lexicon,
};
pub use executor::DryRunExecutor;
pub use storage::{FileStoreOptions, InMemoryTaskRepository, JsonFileTaskRepository};
pub use telemetry::JsonlPerformanceSink;
