//! Queue error taxonomy.

use thiserror::Error;

use super::{TaskId, TaskStatus};

/// Failure modes of queue and store operations.
///
/// Propagation policy:
/// - `Conflict` from a store-level claim race is resolved locally by the
///   queue (the caller lost a race; re-select). A `Conflict` returned from a
///   public operation means "already handled by someone else; no further
///   action" and must not be retried blindly.
/// - Everything else surfaces verbatim to the facade, which maps it to a
///   caller-visible outcome.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Unknown task id, or the task already reached the activity store and
    /// the operation only applies to queued tasks.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// Operation is not legal for the task's current status.
    #[error("task {id} is {status}: {reason}")]
    InvalidState {
        id: TaskId,
        status: TaskStatus,
        reason: &'static str,
    },

    /// A concurrent mutation raced past this caller; benign.
    #[error("task {0} was concurrently modified")]
    Conflict(TaskId),

    /// Infrastructure failure in the backing store; retry with backoff.
    #[error("task store unavailable: {0}")]
    StoreUnavailable(String),
}

impl QueueError {
    pub fn invalid_state(id: TaskId, status: TaskStatus, reason: &'static str) -> Self {
        Self::InvalidState { id, status, reason }
    }
}
