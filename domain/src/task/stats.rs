//! Aggregates over finished tasks.

use super::entities::{BackgroundTask, TaskStatus};
use serde::{Deserialize, Serialize};

/// Outcome statistics over completed and failed tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    /// Completed + failed
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// `completed / total`, 0.0 when nothing has finished
    pub success_rate: f64,
    /// Mean start-to-finish time in milliseconds
    pub avg_duration_ms: f64,
    /// Mean executor-reported quality over tasks that reported one
    pub avg_quality: Option<f64>,
}

impl TaskStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a BackgroundTask>) -> Self {
        let mut stats = TaskStats::default();
        let mut duration_sum = 0.0;
        let mut duration_count = 0usize;
        let mut quality_sum = 0.0;
        let mut quality_count = 0usize;

        for task in tasks {
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
                _ => continue,
            }
            if let Some(duration) = task.duration() {
                duration_sum += duration.num_milliseconds() as f64;
                duration_count += 1;
            }
            if let Some(quality) = task.quality_score {
                quality_sum += quality;
                quality_count += 1;
            }
        }

        stats.total = stats.completed + stats.failed;
        if stats.total > 0 {
            stats.success_rate = stats.completed as f64 / stats.total as f64;
        }
        if duration_count > 0 {
            stats.avg_duration_ms = duration_sum / duration_count as f64;
        }
        if quality_count > 0 {
            stats.avg_quality = Some(quality_sum / quality_count as f64);
        }
        stats
    }
}

/// Task counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueOverview {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl QueueOverview {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a BackgroundTask>) -> Self {
        let mut overview = QueueOverview::default();
        for task in tasks {
            match task.status {
                TaskStatus::Pending => overview.pending += 1,
                TaskStatus::Running => overview.running += 1,
                TaskStatus::Completed => overview.completed += 1,
                TaskStatus::Failed => overview.failed += 1,
            }
        }
        overview
    }

    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed
    }
}
