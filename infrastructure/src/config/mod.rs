//! Configuration file loading for agent-dispatch
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `AGENT_DISPATCH_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./dispatch.toml` or `./.dispatch.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agent-dispatch/config.toml`
//! 5. Default values

mod file_config;
mod lexicon;
mod loader;

pub use file_config::{
    ConfigValidationError, FileClassifierConfig, FileConfig, FileOutputConfig, FilePlanConfig,
    FileSchedulerConfig, FileStorageConfig, FileTelemetryConfig, StorageBackend,
};
pub use lexicon::{LexiconLoadError, load_lexicon};
pub use loader::ConfigLoader;
