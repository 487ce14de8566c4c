//! Worker pool: claim, process, report.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::domain::{QueueError, Task, TaskOutcome, WorkerId};
use crate::queue::TaskQueue;
use crate::runtime::ProcessorRegistry;

/// Handle over a group of spawned workers.
///
/// Shutdown is cooperative: workers stop claiming new tasks but finish the
/// one they currently own. There is no mechanism to interrupt a running
/// processor.
pub struct WorkerPool {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `n` workers polling the queue.
    ///
    /// `poll_interval` is the wait between claim attempts when nothing is
    /// eligible; it is a worker concern, the queue itself never blocks.
    pub fn spawn(
        n: usize,
        queue: Arc<TaskQueue>,
        registry: Arc<ProcessorRegistry>,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for i in 0..n {
            let worker_id = WorkerId::new(format!("worker-{i}"));
            let queue = Arc::clone(&queue);
            let registry = Arc::clone(&registry);
            let mut rx = shutdown_rx.clone();

            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, queue, registry, poll_interval, &mut rx).await;
            }));
        }

        Self { shutdown_tx, joins }
    }

    /// Ask all workers to stop taking new claims.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for every worker to exit.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
    }
}

async fn worker_loop(
    worker_id: WorkerId,
    queue: Arc<TaskQueue>,
    registry: Arc<ProcessorRegistry>,
    poll_interval: Duration,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let claimed = match queue.claim_next(&worker_id).await {
            Ok(claimed) => claimed,
            Err(QueueError::StoreUnavailable(reason)) => {
                warn!(worker = %worker_id, %reason, "store unavailable, backing off");
                None
            }
            Err(e) => {
                error!(worker = %worker_id, error = %e, "claim failed");
                None
            }
        };

        let Some(task) = claimed else {
            // Nothing eligible right now; wait, but wake early on shutdown.
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = tokio::time::sleep(poll_interval) => {}
            }
            continue;
        };

        let outcome = run_processor(&registry, &task).await;

        // The queue never hears about processor errors, only the outcome.
        match queue.complete(task.id, outcome).await {
            Ok(()) => {}
            Err(QueueError::Conflict(_)) => {
                // Already handled elsewhere; nothing more to do.
                debug!(worker = %worker_id, task = %task.id, "completion lost a race");
            }
            Err(e) => {
                error!(worker = %worker_id, task = %task.id, error = %e, "failed to report outcome");
            }
        }
    }
}

/// Execute the processor inside a child task so a panic is contained and
/// still reported as Failed. A worker must never leave a task perpetually
/// InProgress through its own fault.
async fn run_processor(registry: &Arc<ProcessorRegistry>, task: &Task) -> TaskOutcome {
    let registry = Arc::clone(registry);
    let task_for_exec = task.clone();
    let joined = tokio::spawn(async move { registry.execute(&task_for_exec).await }).await;

    match joined {
        Ok(Ok(())) => TaskOutcome::Success,
        Ok(Err(failure)) => {
            warn!(task = %task.id, %failure, "processing failed");
            TaskOutcome::Failed
        }
        Err(join_err) => {
            warn!(task = %task.id, panicked = join_err.is_panic(), "processor aborted");
            TaskOutcome::Failed
        }
    }
}
