//! Processor registry and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Task, TaskType};

/// A processor reported failure, or no processor exists for the task type.
///
/// Recorded as task status Failed; never surfaced as a queue-level error.
#[derive(Debug, Error)]
pub enum ProcessingFailure {
    #[error("no processor registered for task_type={0}")]
    ProcessorNotFound(TaskType),

    #[error("{0}")]
    Failed(String),
}

/// Registering the same task type twice is a wiring bug, caught at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate processor for task_type={0}")]
    DuplicateProcessor(TaskType),
}

/// The opaque analysis function behind a task type.
///
/// Invoked exactly once per claim. May take arbitrarily long; the queue
/// enforces no timeout.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, task: &Task) -> Result<(), ProcessingFailure>;
}

/// Fixed dispatch table from task type to processor.
///
/// Built mutably during startup wiring, then shared immutably behind an
/// `Arc`; no runtime registration, no locks on the hot path.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<TaskType, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        task_type: TaskType,
        processor: Arc<dyn Processor>,
    ) -> Result<(), RegistryError> {
        if self.processors.contains_key(&task_type) {
            return Err(RegistryError::DuplicateProcessor(task_type));
        }
        self.processors.insert(task_type, processor);
        Ok(())
    }

    pub fn get(&self, task_type: &TaskType) -> Option<&Arc<dyn Processor>> {
        self.processors.get(task_type)
    }

    /// Resolve the task's processor and run it.
    pub async fn execute(&self, task: &Task) -> Result<(), ProcessingFailure> {
        let processor = self
            .get(&task.task_type)
            .ok_or_else(|| ProcessingFailure::ProcessorNotFound(task.task_type.clone()))?;
        processor.process(task).await
    }
}
