//! TaskStore port: durable storage for task and activity records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    ActivityFilter, ActivityRecord, ComponentKey, QueueError, Task, TaskId, TaskStatus, WorkerId,
};

/// Durable, key-addressed storage for queued tasks and their activity
/// history. The single source of truth: workers and facade callers route
/// every mutation through it.
///
/// The trait is the seam for swapping implementations; the in-memory store
/// backs tests and development, a relational implementation would run each
/// mutating method in one transaction.
///
/// Two primitives carry the correctness load:
/// - [`claim`](TaskStore::claim) is a compare-and-swap on task state that
///   also enforces the per-component exclusion invariant;
/// - [`finalize`](TaskStore::finalize) is the atomic move that deletes a
///   queued task and writes its activity counterpart in one indivisible
///   step, so a task never exists as both, and never as neither.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new Pending task.
    async fn insert(&self, task: Task) -> Result<(), QueueError>;

    /// Look up a queued (Pending or InProgress) task.
    async fn get(&self, id: TaskId) -> Result<Option<Task>, QueueError>;

    /// Pending tasks ordered by `(submitted_at, id)`, optionally restricted
    /// to one component.
    async fn list_pending(
        &self,
        component: Option<&ComponentKey>,
    ) -> Result<Vec<Task>, QueueError>;

    /// All InProgress tasks. Used for claim-time component exclusion, and
    /// carries everything (`started_at`, `worker_id`) a future stale-lease
    /// reaper would need.
    async fn list_in_progress(&self) -> Result<Vec<Task>, QueueError>;

    /// Compare-and-swap claim: transition the task Pending -> InProgress,
    /// binding it to `worker_id` with `started_at = now`.
    ///
    /// Fails with `Conflict` if the task is no longer Pending, or if any
    /// task with the same component key is already InProgress; fails with
    /// `NotFound` for an unknown id. Both checks and the transition happen
    /// atomically with respect to every other store mutation.
    async fn claim(
        &self,
        id: TaskId,
        worker_id: WorkerId,
        now: DateTime<Utc>,
    ) -> Result<Task, QueueError>;

    /// Atomic move: delete the queued task and insert its activity record
    /// with `final_status` and `finished_at = now`, in one indivisible step.
    ///
    /// Fails with `NotFound` for an unknown id; fails with `Conflict` if the
    /// task's current status is not `expected` (defends against
    /// double-completion).
    async fn finalize(
        &self,
        id: TaskId,
        expected: TaskStatus,
        final_status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<ActivityRecord, QueueError>;

    /// Look up a finished task's activity record.
    async fn get_activity(&self, id: TaskId) -> Result<Option<ActivityRecord>, QueueError>;

    /// History query, snapshot-consistent: no partially written record is
    /// ever visible.
    async fn list_activity(&self, filter: &ActivityFilter)
        -> Result<Vec<ActivityRecord>, QueueError>;
}
