//! Activity records: immutable history of finished tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ComponentKey, Task, TaskId, TaskStatus, TaskType};

/// Immutable copy of a task's final state, written exactly once when the
/// task leaves the queue. Never updated or deleted by the queue itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: TaskId,
    pub task_type: TaskType,
    pub component_key: ComponentKey,

    /// Always terminal: Success, Failed or Canceled.
    pub status: TaskStatus,

    pub submitted_at: DateTime<Utc>,

    /// None for tasks canceled before any worker claimed them.
    pub started_at: Option<DateTime<Utc>>,

    pub finished_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Snapshot a task at its terminal transition.
    pub fn from_task(task: &Task, final_status: TaskStatus, finished_at: DateTime<Utc>) -> Self {
        debug_assert!(final_status.is_terminal());
        Self {
            id: task.id,
            task_type: task.task_type.clone(),
            component_key: task.component_key.clone(),
            status: final_status,
            submitted_at: task.submitted_at,
            started_at: task.started_at,
            finished_at,
        }
    }
}

/// Filter for history queries. `Default` matches everything.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub component_key: Option<ComponentKey>,
    pub task_type: Option<TaskType>,
    pub status: Option<TaskStatus>,
}

impl ActivityFilter {
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        self.component_key
            .as_ref()
            .is_none_or(|key| record.component_key == *key)
            && self
                .task_type
                .as_ref()
                .is_none_or(|t| record.task_type == *t)
            && self.status.is_none_or(|s| record.status == s)
    }
}
