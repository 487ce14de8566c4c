//! End-to-end demonstration: wire a queue, run workers, submit and cancel
//! analysis tasks, and print the resulting activity history.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use conveyor_core::{
    AccessControl, ActivityFilter, Caller, ComponentKey, InMemoryTaskStore, ProcessingFailure,
    Processor, ProcessorRegistry, QueueFacade, SystemClock, Task, TaskQueue, TaskStatus, TaskType,
    TaskView, UlidIdGenerator, WorkerPool,
};

#[derive(Debug, Deserialize)]
struct ReportPayload {
    report: String,
}

/// Stand-in for the analysis subsystem: decodes the payload and pretends to
/// crunch a report. Reports named "broken" fail.
struct ReportProcessor;

#[async_trait]
impl Processor for ReportProcessor {
    async fn process(&self, task: &Task) -> Result<(), ProcessingFailure> {
        let payload: ReportPayload = serde_json::from_value(task.payload.clone())
            .map_err(|e| ProcessingFailure::Failed(format!("payload decode: {e}")))?;

        tokio::time::sleep(Duration::from_millis(50)).await;
        if payload.report == "broken" {
            return Err(ProcessingFailure::Failed("unparseable report".into()));
        }
        println!("processed report '{}' for {}", payload.report, task.component_key);
        Ok(())
    }
}

/// Demo authorization: "admin" holds the administrative capability, every
/// caller may access every component.
struct DemoAccess;

impl AccessControl for DemoAccess {
    fn is_admin(&self, caller: &Caller) -> bool {
        caller.name == "admin"
    }

    fn can_access(&self, _caller: &Caller, _component: &ComponentKey) -> bool {
        true
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Explicit wiring: store, queue, dispatch table, workers, facade.
    let queue = Arc::new(TaskQueue::new(
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(UlidIdGenerator::new(SystemClock)),
        Arc::new(SystemClock),
    ));

    let mut registry = ProcessorRegistry::new();
    registry
        .register(TaskType::new("report-processing"), Arc::new(ReportProcessor))
        .expect("fresh registry");
    let registry = Arc::new(registry);

    let pool = WorkerPool::spawn(
        2,
        Arc::clone(&queue),
        registry,
        Duration::from_millis(20),
    );

    let facade = QueueFacade::new(Arc::clone(&queue), Arc::new(DemoAccess));
    let admin = Caller::new("admin");

    // Two components, plus one task we cancel before any worker sees it.
    let mut ids = Vec::new();
    for (component, report) in [("proj-a", "weekly"), ("proj-b", "broken"), ("proj-a", "daily")] {
        let id = facade
            .submit(
                &admin,
                TaskType::new("report-processing"),
                ComponentKey::new(component),
                serde_json::json!({ "report": report }),
            )
            .await
            .expect("submit");
        ids.push(id);
    }

    let doomed = facade
        .submit(
            &admin,
            TaskType::new("report-processing"),
            ComponentKey::new("proj-c"),
            serde_json::json!({ "report": "never-runs" }),
        )
        .await
        .expect("submit");
    match facade.cancel(&admin, doomed).await {
        Ok(()) => println!("canceled {doomed} while pending"),
        Err(e) => println!("cancel of {doomed} rejected: {e}"),
    }
    ids.push(doomed);

    // Poll until every task is in the history.
    for id in &ids {
        loop {
            match facade.status(&admin, *id).await.expect("status") {
                TaskView::Completed(record) => {
                    println!("{} -> {}", record.id, record.status);
                    break;
                }
                TaskView::Queued(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
    }

    let failed = facade
        .list_activity(
            &admin,
            &ActivityFilter {
                status: Some(TaskStatus::Failed),
                ..Default::default()
            },
        )
        .await
        .expect("activity");
    println!("{} task(s) failed", failed.len());

    pool.shutdown_and_join().await;
}
