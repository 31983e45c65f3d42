//! In-process task table shared by the repository adapters.
//!
//! Insertion order is the vector order, which is the last claim tie-break.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use dispatch_domain::{
    AgentId, BackgroundTask, QueueOverview, RepositoryError, TaskId, TaskStats, TaskStatus,
};
use serde::{Deserialize, Serialize};

/// Snapshot format version written by [`TaskTable`].
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTable {
    #[serde(default = "snapshot_version")]
    version: u32,
    tasks: Vec<BackgroundTask>,
    /// Store handle that claimed each running task.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    claims: BTreeMap<TaskId, String>,
}

fn snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTable {
    pub fn new() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tasks: Vec::new(),
            claims: BTreeMap::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn insert(&mut self, task: BackgroundTask) -> Result<(), RepositoryError> {
        if self.tasks.iter().any(|t| t.id == task.id) {
            return Err(RepositoryError::Duplicate(task.id));
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn get(&self, id: &TaskId) -> Option<&BackgroundTask> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Select-then-start in one step; callers hold the table lock.
    pub fn claim_next(&mut self, now: DateTime<Utc>) -> Option<BackgroundTask> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_eligible(now))
            .min_by_key(|(i, t)| (t.priority, t.created_at, *i))
            .map(|(i, _)| i)?;

        let task = &mut self.tasks[index];
        // Eligible implies pending, so start cannot fail.
        task.start(now).ok()?;
        Some(task.clone())
    }

    pub fn compare_and_swap(
        &mut self,
        task: &BackgroundTask,
        expected: TaskStatus,
    ) -> Result<bool, RepositoryError> {
        let stored = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| RepositoryError::NotFound(task.id.clone()))?;
        if stored.status != expected {
            return Ok(false);
        }
        *stored = task.clone();
        if task.status != TaskStatus::Running {
            self.claims.remove(&task.id);
        }
        Ok(true)
    }

    /// Remember which store handle owns a claimed task.
    pub fn record_claim(&mut self, id: &TaskId, holder: &str) {
        self.claims.insert(id.clone(), holder.to_string());
    }

    pub fn claimant(&self, id: &TaskId) -> Option<&str> {
        self.claims.get(id).map(String::as_str)
    }

    /// Tasks in claim order: priority, then age, then insertion.
    pub fn list(&self, status: Option<TaskStatus>) -> Vec<BackgroundTask> {
        let mut tasks: Vec<(usize, &BackgroundTask)> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| status.is_none_or(|s| t.status == s))
            .collect();
        tasks.sort_by_key(|(i, t)| (t.priority, t.created_at, *i));
        tasks.into_iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.scheduled_for)
            .min()
    }

    pub fn stats(&self, agent_id: Option<&AgentId>) -> TaskStats {
        TaskStats::from_tasks(
            self.tasks
                .iter()
                .filter(|t| agent_id.is_none_or(|a| &t.agent_id == a)),
        )
    }

    pub fn overview(&self) -> QueueOverview {
        QueueOverview::from_tasks(&self.tasks)
    }

    pub fn purge_finished(&mut self, before: DateTime<Utc>) -> usize {
        let len = self.tasks.len();
        self.tasks.retain(|t| !t.is_purgeable(before));
        len - self.tasks.len()
    }

    /// Return `running` tasks whose claimant is not in `live` to `pending`.
    ///
    /// A task with no recorded claimant counts as orphaned.
    pub fn requeue_orphaned(&mut self, live: &BTreeSet<String>) -> usize {
        let mut requeued = 0;
        for task in self.tasks.iter_mut() {
            if task.status != TaskStatus::Running
                || self.claims.get(&task.id).is_some_and(|h| live.contains(h))
            {
                continue;
            }
            self.claims.remove(&task.id);
            if task.requeue_interrupted().is_ok() {
                requeued += 1;
            }
        }
        requeued
    }
}
