//! Task queue: submit, claim, complete, cancel, query.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{
    ActivityFilter, ActivityRecord, ComponentKey, QueueError, Task, TaskId, TaskOutcome,
    TaskStatus, TaskType, WorkerId,
};
use crate::ports::{Clock, IdGenerator, TaskStore};

/// A task as seen by a status query: still queued, or already in history.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskView {
    Queued(Task),
    Completed(ActivityRecord),
}

impl TaskView {
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Queued(task) => task.status,
            Self::Completed(record) => record.status,
        }
    }
}

/// The queue over a [`TaskStore`].
///
/// Holds no task state of its own: the store is the single source of truth,
/// and all atomicity lives in the store's `claim`/`finalize` primitives.
/// Safe to share (`Arc`) between workers and facade callers.
///
/// Dependencies are passed in at construction; there is no ambient global
/// queue instance.
pub struct TaskQueue {
    store: Arc<dyn TaskStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl TaskQueue {
    pub fn new(store: Arc<dyn TaskStore>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { store, ids, clock }
    }

    /// Submit a new task. Fails only when the store is unavailable.
    pub async fn submit(
        &self,
        task_type: TaskType,
        component_key: ComponentKey,
        payload: serde_json::Value,
    ) -> Result<TaskId, QueueError> {
        let id = self.ids.next_task_id();
        let task = Task::pending(id, task_type, component_key, payload, self.clock.now());
        info!(task = %id, component = %task.component_key, task_type = %task.task_type, "task submitted");
        self.store.insert(task).await?;
        Ok(id)
    }

    /// Claim the oldest pending task whose component has no in-progress
    /// task. `Ok(None)` when nothing is eligible — a normal outcome, not a
    /// failure. Never blocks.
    ///
    /// Selection runs against a snapshot; the store's compare-and-swap
    /// re-checks both the task's status and the component exclusion, so a
    /// `Conflict` here just means another claimer won the race and we
    /// re-select.
    pub async fn claim_next(&self, worker_id: &WorkerId) -> Result<Option<Task>, QueueError> {
        loop {
            let pending = self.store.list_pending(None).await?;
            let busy: Vec<ComponentKey> = self
                .store
                .list_in_progress()
                .await?
                .into_iter()
                .map(|t| t.component_key)
                .collect();

            let candidate = pending
                .into_iter()
                .find(|t| !busy.contains(&t.component_key));
            let Some(candidate) = candidate else {
                return Ok(None);
            };

            match self
                .store
                .claim(candidate.id, worker_id.clone(), self.clock.now())
                .await
            {
                Ok(task) => {
                    debug!(task = %task.id, worker = %worker_id, "task claimed");
                    return Ok(Some(task));
                }
                // Lost the race (claimed, canceled or component taken since
                // the snapshot). Re-select.
                Err(QueueError::Conflict(_)) | Err(QueueError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Record the outcome of an in-progress task: the atomic move into the
    /// activity store.
    ///
    /// `Conflict` means the task is not InProgress under this call (already
    /// completed or canceled by a concurrent actor): the caller must treat
    /// it as "already handled, no further action."
    pub async fn complete(&self, id: TaskId, outcome: TaskOutcome) -> Result<(), QueueError> {
        let final_status = outcome.as_status();
        match self
            .store
            .finalize(id, TaskStatus::InProgress, final_status, self.clock.now())
            .await
        {
            Ok(record) => {
                info!(task = %id, status = %record.status, "task completed");
                Ok(())
            }
            Err(QueueError::NotFound(_)) => {
                // An id already in the activity store was handled
                // concurrently: a conflict, not an unknown task.
                if self.store.get_activity(id).await?.is_some() {
                    Err(QueueError::Conflict(id))
                } else {
                    Err(QueueError::NotFound(id))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Cancel a task that has not started. In-progress tasks cannot be
    /// canceled; unknown or already-finished ids report `NotFound`.
    pub async fn cancel(&self, id: TaskId, requested_by: &str) -> Result<(), QueueError> {
        match self
            .store
            .finalize(id, TaskStatus::Pending, TaskStatus::Canceled, self.clock.now())
            .await
        {
            Ok(_) => {
                info!(task = %id, requested_by, "task canceled");
                Ok(())
            }
            Err(QueueError::Conflict(_)) => {
                // Not Pending: the only other queued status is InProgress.
                // If the task finished in the meantime it is simply gone.
                let Some(task) = self.store.get(id).await? else {
                    return Err(QueueError::NotFound(id));
                };
                Err(QueueError::invalid_state(
                    id,
                    task.status,
                    "in-progress tasks cannot be canceled",
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Look up a task across the queue and the activity history.
    pub async fn status(&self, id: TaskId) -> Result<TaskView, QueueError> {
        if let Some(task) = self.store.get(id).await? {
            return Ok(TaskView::Queued(task));
        }
        match self.store.get_activity(id).await? {
            Some(record) => Ok(TaskView::Completed(record)),
            None => Err(QueueError::NotFound(id)),
        }
    }

    /// Ordered pending tasks, optionally for one component.
    pub async fn list_pending(
        &self,
        component: Option<&ComponentKey>,
    ) -> Result<Vec<Task>, QueueError> {
        self.store.list_pending(component).await
    }

    /// History query over finished tasks.
    pub async fn list_activity(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<ActivityRecord>, QueueError> {
        self.store.list_activity(filter).await
    }
}
