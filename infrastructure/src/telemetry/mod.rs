//! Telemetry infrastructure — agent performance records.
//!
//! Provides [`JsonlPerformanceSink`], a JSONL file writer that implements
//! the [`PerformanceSink`](dispatch_application::PerformanceSink) port.

mod jsonl_sink;

pub use jsonl_sink::JsonlPerformanceSink;
