//! Domain model (ids, task records, statuses, activity history, errors).

pub mod activity;
pub mod errors;
pub mod ids;
pub mod status;
pub mod task;

pub use activity::{ActivityFilter, ActivityRecord};
pub use errors::QueueError;
pub use ids::{TaskId, WorkerId};
pub use status::TaskStatus;
pub use task::{ComponentKey, Task, TaskType};

/// Outcome a worker reports when processing ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

impl TaskOutcome {
    /// The terminal status this outcome maps to.
    pub fn as_status(self) -> TaskStatus {
        match self {
            Self::Success => TaskStatus::Success,
            Self::Failed => TaskStatus::Failed,
        }
    }
}
