//! Task status machine.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
///
/// Transitions are one-directional:
/// - Pending -> InProgress -> Success
/// - Pending -> InProgress -> Failed
/// - Pending -> Canceled
///
/// There is no transition out of a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in the queue, eligible for claiming.
    Pending,

    /// Claimed by a worker and currently being processed.
    InProgress,

    /// Processing finished successfully.
    Success,

    /// Processing reported failure.
    Failed,

    /// Removed from the queue before any worker claimed it.
    Canceled,
}

impl TaskStatus {
    /// Canonical storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    /// Is this a terminal status (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
