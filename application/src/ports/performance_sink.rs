//! Port for agent performance telemetry.
//!
//! Every finished agent step and background task produces one
//! [`PerformanceRecord`]. This is separate from `tracing`-based operation
//! logs: tracing carries diagnostics, this port carries the per-execution
//! outcome data that later feeds agent learning.

use dispatch_domain::AgentId;
use serde::{Deserialize, Serialize};

/// Outcome of one agent execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub agent_id: AgentId,
    /// Task type for background work, step role for plan dispatch
    pub task_type: String,
    pub duration_ms: u64,
    pub success: bool,
    pub quality_score: Option<f64>,
}

impl PerformanceRecord {
    pub fn new(
        agent_id: impl Into<AgentId>,
        task_type: impl Into<String>,
        duration_ms: u64,
        success: bool,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            task_type: task_type.into(),
            duration_ms,
            success,
            quality_score: None,
        }
    }

    pub fn with_quality(mut self, quality_score: Option<f64>) -> Self {
        self.quality_score = quality_score;
        self
    }
}

/// Sink for performance records.
///
/// `record` is synchronous and non-fallible: a broken sink must not fail the
/// task it is reporting on.
pub trait PerformanceSink: Send + Sync {
    fn record(&self, record: PerformanceRecord);
}

/// No-op sink for tests and when telemetry is disabled.
pub struct NoTelemetry;

impl PerformanceSink for NoTelemetry {
    fn record(&self, _record: PerformanceRecord) {}
}
