//! conveyor-core
//!
//! Core building blocks for the Conveyor analysis-task queue.
//!
//! - **domain**: task records, statuses, activity history, error taxonomy
//! - **ports**: trait seams (TaskStore, Clock, IdGenerator, AccessControl)
//! - **store**: in-memory TaskStore implementation
//! - **queue**: submit / claim / complete / cancel / query over a store
//! - **runtime**: processor registry (task type -> processing function)
//! - **worker**: the worker pool driving claim -> process -> report
//! - **facade**: authorization boundary for the web/service layer

pub mod domain;
pub mod facade;
pub mod ports;
pub mod queue;
pub mod runtime;
pub mod store;
pub mod worker;

pub use domain::{
    ActivityFilter, ActivityRecord, ComponentKey, QueueError, Task, TaskId, TaskOutcome,
    TaskStatus, TaskType, WorkerId,
};
pub use facade::{FacadeError, QueueFacade};
pub use ports::{AccessControl, Caller, Clock, IdGenerator, SystemClock, TaskStore, UlidIdGenerator};
pub use queue::{TaskQueue, TaskView};
pub use runtime::{ProcessingFailure, Processor, ProcessorRegistry, RegistryError};
pub use store::InMemoryTaskStore;
pub use worker::WorkerPool;
