//! Presentation layer for agent-dispatch
//!
//! This crate contains CLI definitions and output formatters.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{
    Cli, Command, OutputFormat, RequestArgs, ScheduleArgs, StatusFilter, WorkArgs,
};
pub use output::console::ConsoleFormatter;
