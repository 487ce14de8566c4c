//! In-memory task store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    ActivityFilter, ActivityRecord, ComponentKey, QueueError, Task, TaskId, TaskStatus, WorkerId,
};
use crate::ports::TaskStore;

/// Store state behind one lock.
///
/// Every trait method takes the lock exactly once, so `claim` and `finalize`
/// are atomic with respect to each other and to every other mutation. A task
/// id lives in `tasks` or in `activity`, never in both.
struct StoreState {
    /// Queued tasks (Pending and InProgress).
    tasks: HashMap<TaskId, Task>,

    /// Immutable history of finished tasks.
    activity: HashMap<TaskId, ActivityRecord>,
}

impl StoreState {
    fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            activity: HashMap::new(),
        }
    }

    /// Is any task on this component currently InProgress?
    fn component_busy(&self, component: &ComponentKey) -> bool {
        self.tasks.values().any(|t| {
            t.status == TaskStatus::InProgress && t.component_key == *component
        })
    }
}

/// In-memory [`TaskStore`], the development and test implementation.
///
/// Stands in for the durable relational store; a SQL implementation would
/// run `claim` and `finalize` each in one transaction.
pub struct InMemoryTaskStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::new())),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        state.tasks.insert(task.id, task);
        Ok(())
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, QueueError> {
        let state = self.state.lock().await;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_pending(
        &self,
        component: Option<&ComponentKey>,
    ) -> Result<Vec<Task>, QueueError> {
        let state = self.state.lock().await;
        let mut pending: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| component.is_none_or(|key| t.component_key == *key))
            .cloned()
            .collect();
        pending.sort_by(|a, b| (a.submitted_at, a.id).cmp(&(b.submitted_at, b.id)));
        Ok(pending)
    }

    async fn list_in_progress(&self) -> Result<Vec<Task>, QueueError> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::InProgress)
            .cloned()
            .collect())
    }

    async fn claim(
        &self,
        id: TaskId,
        worker_id: WorkerId,
        now: DateTime<Utc>,
    ) -> Result<Task, QueueError> {
        let mut state = self.state.lock().await;

        let component = match state.tasks.get(&id) {
            Some(task) if task.status == TaskStatus::Pending => task.component_key.clone(),
            Some(_) => return Err(QueueError::Conflict(id)),
            None => return Err(QueueError::NotFound(id)),
        };

        if state.component_busy(&component) {
            return Err(QueueError::Conflict(id));
        }

        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(QueueError::NotFound(id))?;
        task.start(worker_id, now);
        Ok(task.clone())
    }

    async fn finalize(
        &self,
        id: TaskId,
        expected: TaskStatus,
        final_status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<ActivityRecord, QueueError> {
        let mut state = self.state.lock().await;

        match state.tasks.get(&id) {
            Some(task) if task.status == expected => {}
            Some(_) => return Err(QueueError::Conflict(id)),
            None => return Err(QueueError::NotFound(id)),
        }

        // Delete + insert under the same lock: the atomic move.
        let task = state.tasks.remove(&id).ok_or(QueueError::NotFound(id))?;
        let record = ActivityRecord::from_task(&task, final_status, now);
        state.activity.insert(id, record.clone());
        Ok(record)
    }

    async fn get_activity(&self, id: TaskId) -> Result<Option<ActivityRecord>, QueueError> {
        let state = self.state.lock().await;
        Ok(state.activity.get(&id).cloned())
    }

    async fn list_activity(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<ActivityRecord>, QueueError> {
        let state = self.state.lock().await;
        let mut records: Vec<ActivityRecord> = state
            .activity
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| (a.finished_at, a.id).cmp(&(b.finished_at, b.id)));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskType;
    use chrono::TimeZone;
    use ulid::Ulid;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, secs).unwrap()
    }

    fn task(component: &str, submitted: DateTime<Utc>) -> Task {
        Task::pending(
            TaskId::from_ulid(Ulid::new()),
            TaskType::new("report-processing"),
            ComponentKey::new(component),
            serde_json::json!({}),
            submitted,
        )
    }

    #[tokio::test]
    async fn list_pending_orders_by_submission_then_id() {
        let store = InMemoryTaskStore::new();
        let b = task("p2", ts(2));
        let a = task("p1", ts(1));
        // Same instant: id (time-ordered ULID) breaks the tie.
        let c1 = task("p3", ts(3));
        let c2 = task("p4", ts(3));

        for t in [&b, &a, &c2, &c1] {
            store.insert(t.clone()).await.unwrap();
        }

        let pending = store.list_pending(None).await.unwrap();
        let ids: Vec<TaskId> = pending.iter().map(|t| t.id).collect();
        let (first_tie, second_tie) = if c1.id < c2.id {
            (c1.id, c2.id)
        } else {
            (c2.id, c1.id)
        };
        assert_eq!(ids, vec![a.id, b.id, first_tie, second_tie]);
    }

    #[tokio::test]
    async fn claim_rejects_non_pending_task() {
        let store = InMemoryTaskStore::new();
        let t = task("p1", ts(1));
        store.insert(t.clone()).await.unwrap();

        store
            .claim(t.id, WorkerId::new("w0"), ts(2))
            .await
            .unwrap();

        // Already InProgress: a second claim loses.
        let err = store
            .claim(t.id, WorkerId::new("w1"), ts(3))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Conflict(id) if id == t.id));
    }

    #[tokio::test]
    async fn claim_enforces_component_exclusion() {
        let store = InMemoryTaskStore::new();
        let a = task("p1", ts(1));
        let b = task("p1", ts(2));
        store.insert(a.clone()).await.unwrap();
        store.insert(b.clone()).await.unwrap();

        store
            .claim(a.id, WorkerId::new("w0"), ts(3))
            .await
            .unwrap();

        let err = store
            .claim(b.id, WorkerId::new("w1"), ts(3))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Conflict(id) if id == b.id));

        // b is untouched and still claimable once p1 frees up.
        let b_after = store.get(b.id).await.unwrap().unwrap();
        assert_eq!(b_after.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn claim_unknown_id_is_not_found() {
        let store = InMemoryTaskStore::new();
        let ghost = TaskId::from_ulid(Ulid::new());
        let err = store
            .claim(ghost, WorkerId::new("w0"), ts(1))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::NotFound(id) if id == ghost));
    }

    #[tokio::test]
    async fn finalize_moves_task_to_activity() {
        let store = InMemoryTaskStore::new();
        let t = task("p1", ts(1));
        store.insert(t.clone()).await.unwrap();
        store
            .claim(t.id, WorkerId::new("w0"), ts(2))
            .await
            .unwrap();

        let record = store
            .finalize(t.id, TaskStatus::InProgress, TaskStatus::Success, ts(5))
            .await
            .unwrap();

        assert_eq!(record.status, TaskStatus::Success);
        assert_eq!(record.started_at, Some(ts(2)));
        assert_eq!(record.finished_at, ts(5));

        // Gone from the queue, present exactly once in history.
        assert!(store.get(t.id).await.unwrap().is_none());
        assert_eq!(store.get_activity(t.id).await.unwrap().unwrap(), record);
    }

    #[tokio::test]
    async fn finalize_with_wrong_expected_status_is_conflict() {
        let store = InMemoryTaskStore::new();
        let t = task("p1", ts(1));
        store.insert(t.clone()).await.unwrap();

        // Still Pending, but the caller expected InProgress.
        let err = store
            .finalize(t.id, TaskStatus::InProgress, TaskStatus::Success, ts(5))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Conflict(id) if id == t.id));

        // Nothing moved.
        assert!(store.get(t.id).await.unwrap().is_some());
        assert!(store.get_activity(t.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn double_finalize_is_not_found() {
        let store = InMemoryTaskStore::new();
        let t = task("p1", ts(1));
        store.insert(t.clone()).await.unwrap();

        store
            .finalize(t.id, TaskStatus::Pending, TaskStatus::Canceled, ts(2))
            .await
            .unwrap();
        let err = store
            .finalize(t.id, TaskStatus::Pending, TaskStatus::Canceled, ts(3))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::NotFound(id) if id == t.id));
    }

    #[tokio::test]
    async fn list_activity_filters_by_status() {
        let store = InMemoryTaskStore::new();
        let a = task("p1", ts(1));
        let b = task("p2", ts(2));
        store.insert(a.clone()).await.unwrap();
        store.insert(b.clone()).await.unwrap();

        store
            .finalize(a.id, TaskStatus::Pending, TaskStatus::Canceled, ts(3))
            .await
            .unwrap();
        store
            .claim(b.id, WorkerId::new("w0"), ts(3))
            .await
            .unwrap();
        store
            .finalize(b.id, TaskStatus::InProgress, TaskStatus::Success, ts(4))
            .await
            .unwrap();

        let canceled = store
            .list_activity(&ActivityFilter {
                status: Some(TaskStatus::Canceled),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(canceled.len(), 1);
        assert_eq!(canceled[0].id, a.id);

        let all = store.list_activity(&ActivityFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
