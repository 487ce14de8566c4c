//! Queue facade: the boundary exposed to the web/service layer.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::domain::{
    ActivityFilter, ActivityRecord, ComponentKey, QueueError, Task, TaskId, TaskType,
};
use crate::ports::{AccessControl, Caller};
use crate::queue::{TaskQueue, TaskView};

/// Caller-facing outcomes. Storage-layer detail never crosses this boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FacadeError {
    #[error("insufficient permissions")]
    Forbidden,

    #[error("task not found")]
    NotFound,

    #[error("{0}")]
    InvalidState(&'static str),

    #[error("task was already handled")]
    Conflict,

    #[error("service temporarily unavailable")]
    Unavailable,
}

impl From<QueueError> for FacadeError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::NotFound(_) => Self::NotFound,
            QueueError::InvalidState { reason, .. } => Self::InvalidState(reason),
            QueueError::Conflict(_) => Self::Conflict,
            QueueError::StoreUnavailable(_) => Self::Unavailable,
        }
    }
}

/// Thin authorization wrapper over [`TaskQueue`].
///
/// Wired explicitly at startup with its queue and access-control
/// dependencies; no runtime discovery of actions or permissions.
pub struct QueueFacade {
    queue: Arc<TaskQueue>,
    access: Arc<dyn AccessControl>,
}

impl QueueFacade {
    pub fn new(queue: Arc<TaskQueue>, access: Arc<dyn AccessControl>) -> Self {
        Self { queue, access }
    }

    /// Submit a task against a component the caller may access.
    pub async fn submit(
        &self,
        caller: &Caller,
        task_type: TaskType,
        component_key: ComponentKey,
        payload: serde_json::Value,
    ) -> Result<TaskId, FacadeError> {
        if !self.access.can_access(caller, &component_key) {
            return Err(FacadeError::Forbidden);
        }
        Ok(self.queue.submit(task_type, component_key, payload).await?)
    }

    /// Cancel a pending task. Requires administrative capability;
    /// in-progress tasks cannot be canceled.
    pub async fn cancel(&self, caller: &Caller, id: TaskId) -> Result<(), FacadeError> {
        if !self.access.is_admin(caller) {
            debug!(caller = %caller.name, task = %id, "cancel refused: not an administrator");
            return Err(FacadeError::Forbidden);
        }
        Ok(self.queue.cancel(id, &caller.name).await?)
    }

    /// Current state of a task, queued or finished.
    ///
    /// Tasks of components the caller may not access answer `NotFound`
    /// rather than reveal their existence.
    pub async fn status(&self, caller: &Caller, id: TaskId) -> Result<TaskView, FacadeError> {
        let view = self.queue.status(id).await?;
        let component = match &view {
            TaskView::Queued(task) => &task.component_key,
            TaskView::Completed(record) => &record.component_key,
        };
        if !self.access.can_access(caller, component) {
            return Err(FacadeError::NotFound);
        }
        Ok(view)
    }

    /// Ordered pending tasks. Listing across all components requires
    /// administrative capability.
    pub async fn list_pending(
        &self,
        caller: &Caller,
        component: Option<&ComponentKey>,
    ) -> Result<Vec<Task>, FacadeError> {
        self.check_scope(caller, component)?;
        Ok(self.queue.list_pending(component).await?)
    }

    /// History of finished tasks, for dashboards and indexers.
    pub async fn list_activity(
        &self,
        caller: &Caller,
        filter: &ActivityFilter,
    ) -> Result<Vec<ActivityRecord>, FacadeError> {
        self.check_scope(caller, filter.component_key.as_ref())?;
        Ok(self.queue.list_activity(filter).await?)
    }

    fn check_scope(
        &self,
        caller: &Caller,
        component: Option<&ComponentKey>,
    ) -> Result<(), FacadeError> {
        let allowed = match component {
            Some(key) => self.access.can_access(caller, key),
            None => self.access.is_admin(caller),
        };
        if allowed {
            Ok(())
        } else {
            Err(FacadeError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskStatus, WorkerId};
    use crate::ports::{SystemClock, UlidIdGenerator};
    use crate::store::InMemoryTaskStore;

    /// "admin" may do anything; everyone else may only touch "p1".
    struct TestAccess;

    impl AccessControl for TestAccess {
        fn is_admin(&self, caller: &Caller) -> bool {
            caller.name == "admin"
        }

        fn can_access(&self, caller: &Caller, component: &ComponentKey) -> bool {
            self.is_admin(caller) || component.as_str() == "p1"
        }
    }

    fn facade() -> (QueueFacade, Arc<TaskQueue>) {
        let queue = Arc::new(TaskQueue::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(UlidIdGenerator::new(SystemClock)),
            Arc::new(SystemClock),
        ));
        (
            QueueFacade::new(Arc::clone(&queue), Arc::new(TestAccess)),
            queue,
        )
    }

    async fn submit_as(facade: &QueueFacade, caller: &Caller, component: &str) -> TaskId {
        facade
            .submit(
                caller,
                TaskType::new("report-processing"),
                ComponentKey::new(component),
                serde_json::json!({}),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cancel_requires_admin() {
        let (facade, _) = facade();
        let user = Caller::new("user");
        let admin = Caller::new("admin");

        let id = submit_as(&facade, &user, "p1").await;

        let err = facade.cancel(&user, id).await.unwrap_err();
        assert_eq!(err, FacadeError::Forbidden);

        facade.cancel(&admin, id).await.unwrap();
        let view = facade.status(&admin, id).await.unwrap();
        assert_eq!(view.status(), TaskStatus::Canceled);
    }

    #[tokio::test]
    async fn cancel_of_in_progress_reports_invalid_state() {
        let (facade, queue) = facade();
        let admin = Caller::new("admin");

        let id = submit_as(&facade, &admin, "p1").await;
        queue
            .claim_next(&WorkerId::new("w0"))
            .await
            .unwrap()
            .unwrap();

        let err = facade.cancel(&admin, id).await.unwrap_err();
        assert_eq!(
            err,
            FacadeError::InvalidState("in-progress tasks cannot be canceled")
        );
    }

    #[tokio::test]
    async fn submit_to_inaccessible_component_is_forbidden() {
        let (facade, _) = facade();
        let user = Caller::new("user");

        let err = facade
            .submit(
                &user,
                TaskType::new("report-processing"),
                ComponentKey::new("p2"),
                serde_json::json!({}),
            )
            .await
            .unwrap_err();
        assert_eq!(err, FacadeError::Forbidden);
    }

    #[tokio::test]
    async fn status_hides_inaccessible_tasks() {
        let (facade, _) = facade();
        let admin = Caller::new("admin");
        let user = Caller::new("user");

        let id = submit_as(&facade, &admin, "p2").await;

        // Indistinguishable from a task that does not exist.
        let err = facade.status(&user, id).await.unwrap_err();
        assert_eq!(err, FacadeError::NotFound);
        assert!(facade.status(&admin, id).await.is_ok());
    }

    #[tokio::test]
    async fn listing_all_components_requires_admin() {
        let (facade, _) = facade();
        let admin = Caller::new("admin");
        let user = Caller::new("user");

        submit_as(&facade, &admin, "p1").await;
        submit_as(&facade, &admin, "p2").await;

        let err = facade.list_pending(&user, None).await.unwrap_err();
        assert_eq!(err, FacadeError::Forbidden);

        let p1 = ComponentKey::new("p1");
        let mine = facade.list_pending(&user, Some(&p1)).await.unwrap();
        assert_eq!(mine.len(), 1);

        let all = facade.list_pending(&admin, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn activity_listing_is_scoped_the_same_way() {
        let (facade, _queue) = facade();
        let admin = Caller::new("admin");
        let user = Caller::new("user");

        let id = submit_as(&facade, &admin, "p2").await;
        facade.cancel(&admin, id).await.unwrap();

        let err = facade
            .list_activity(&user, &ActivityFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err, FacadeError::Forbidden);

        let all = facade
            .list_activity(&admin, &ActivityFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, TaskStatus::Canceled);
    }
}
