//! Task record: the unit of submitted work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{TaskId, TaskStatus, WorkerId};

/// Kind of work a task performs (e.g. "report-processing").
///
/// Dispatch key into the processor registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the entity a task operates on (e.g. a project key).
///
/// Tasks sharing a component key are mutually exclusive: at most one of them
/// may be in progress at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentKey(String);

impl ComponentKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A queued or in-progress task.
///
/// Mutable while Pending/InProgress; once it reaches a terminal status it is
/// converted into an [`ActivityRecord`](super::ActivityRecord) and this
/// record is deleted. The store is the single source of truth; workers hold
/// at most the one task they have claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub component_key: ComponentKey,

    /// Opaque payload handed to the processor; the queue never inspects it.
    pub payload: serde_json::Value,

    pub status: TaskStatus,

    /// Monotonic across submissions; FIFO ordering key (ties broken by id).
    pub submitted_at: DateTime<Utc>,

    /// Set when a worker claims the task.
    pub started_at: Option<DateTime<Utc>>,

    /// Worker currently owning the task while InProgress.
    pub worker_id: Option<WorkerId>,
}

impl Task {
    /// A freshly submitted task, not yet claimed.
    pub fn pending(
        id: TaskId,
        task_type: TaskType,
        component_key: ComponentKey,
        payload: serde_json::Value,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_type,
            component_key,
            payload,
            status: TaskStatus::Pending,
            submitted_at,
            started_at: None,
            worker_id: None,
        }
    }

    /// Transition Pending -> InProgress, binding the task to a worker.
    ///
    /// Callers (the store's claim primitive) must have verified the task is
    /// Pending before calling this.
    pub fn start(&mut self, worker_id: WorkerId, now: DateTime<Utc>) {
        debug_assert_eq!(self.status, TaskStatus::Pending);
        self.status = TaskStatus::InProgress;
        self.worker_id = Some(worker_id);
        self.started_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ulid::Ulid;

    #[test]
    fn start_binds_worker_and_timestamp() {
        let submitted = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let started = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 5).unwrap();
        let mut task = Task::pending(
            TaskId::from_ulid(Ulid::new()),
            TaskType::new("report-processing"),
            ComponentKey::new("p1"),
            serde_json::json!({}),
            submitted,
        );

        assert_eq!(task.status, TaskStatus::Pending);
        task.start(WorkerId::new("worker-0"), started);

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.started_at, Some(started));
        assert_eq!(task.worker_id, Some(WorkerId::new("worker-0")));
        assert_eq!(task.submitted_at, submitted);
    }
}
