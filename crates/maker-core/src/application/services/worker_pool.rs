//! Worker Pool - bounded concurrent execution of generation tasks.
//!
//! ```text
//!                ┌──────────┐
//!   tasks ──────▶│  queue   │ (mpsc, capacity = task count, closed after fill)
//!                └────┬─────┘
//!          ┌──────────┼──────────┐
//!          ▼          ▼          ▼
//!      worker 0   worker 1 … worker N-1   (each: query client, report)
//!          └──────────┼──────────┘
//!                     ▼
//!                ┌──────────┐
//!                │ results  │ (mpsc, one sender per worker)
//!                └────┬─────┘
//!                     ▼
//!               ResultStream ── None once every worker has exited
//! ```
//!
//! Drain is signalled by the result channel closing: each worker owns one
//! sender clone and drops it when the queue is empty or the run is
//! cancelled. A failed task is reported like any other result and the
//! worker moves on to the next one.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, instrument, trace, warn};

use crate::{
    application::ports::GenerationClient,
    domain::{GenerationError, GenerationTask, RelativePath, TaskFailure, TaskId, TaskResult, WorkerCount},
};

type TaskQueue = Arc<Mutex<mpsc::Receiver<GenerationTask>>>;

/// Fixed-size pool of generation workers.
pub struct WorkerPool {
    client: Arc<dyn GenerationClient>,
    size: WorkerCount,
    call_timeout: Duration,
}

impl WorkerPool {
    pub fn new(client: Arc<dyn GenerationClient>, size: WorkerCount, call_timeout: Duration) -> Self {
        Self {
            client,
            size,
            call_timeout,
        }
    }

    pub fn size(&self) -> WorkerCount {
        self.size
    }

    /// Queue every task and start the workers.
    ///
    /// Setting `cancel` to `true` aborts in-flight calls; cancelled tasks
    /// produce no result.
    #[instrument(skip_all, fields(tasks = tasks.len(), workers = self.size.effective(tasks.len())))]
    pub fn dispatch(
        &self,
        tasks: Vec<GenerationTask>,
        cancel: watch::Receiver<bool>,
    ) -> ResultStream {
        let total = tasks.len();
        let capacity = total.max(1);

        let pending = tasks
            .iter()
            .map(|t| (t.id, t.path().clone()))
            .collect::<BTreeMap<_, _>>();

        let (task_tx, task_rx) = mpsc::channel(capacity);
        let (result_tx, result_rx) = mpsc::channel(capacity);

        for task in tasks {
            // Capacity equals the task count and the receiver is alive, so
            // this never fails. A dropped task would surface as `Lost`.
            if let Err(e) = task_tx.try_send(task) {
                warn!(error = %e, "task queue rejected a task");
            }
        }
        drop(task_tx);

        let queue: TaskQueue = Arc::new(Mutex::new(task_rx));
        let mut workers = JoinSet::new();

        if total > 0 {
            for worker in 0..self.size.effective(total) {
                workers.spawn(run_worker(
                    worker,
                    Arc::clone(&queue),
                    result_tx.clone(),
                    Arc::clone(&self.client),
                    self.call_timeout,
                    cancel.clone(),
                ));
            }
        }
        drop(result_tx);

        debug!(total, "tasks dispatched");

        ResultStream {
            results: result_rx,
            workers,
            pending,
            total,
            cancel,
        }
    }
}

/// Results of one dispatch, in completion order.
pub struct ResultStream {
    results: mpsc::Receiver<TaskResult>,
    workers: JoinSet<()>,
    pending: BTreeMap<TaskId, RelativePath>,
    total: usize,
    cancel: watch::Receiver<bool>,
}

impl ResultStream {
    /// Next result, or `None` once every task has been accounted for (or
    /// the run was cancelled).
    ///
    /// If a worker dies while holding a task, that task is reported as
    /// [`TaskFailure::Lost`] after the remaining workers finish, so every
    /// task still yields exactly one result.
    pub async fn next(&mut self) -> Option<TaskResult> {
        if let Some(result) = self.results.recv().await {
            self.pending.remove(&result.task_id);
            return Some(result);
        }

        if *self.cancel.borrow() {
            return None;
        }

        let (task_id, path) = self.pending.pop_first()?;
        warn!(task_id, path = %path, "no result reported for task");
        Some(TaskResult {
            task_id,
            path,
            outcome: Err(TaskFailure::Lost),
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Tasks that have not produced a result yet.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Abort any remaining workers and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.workers.abort_all();
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    warn!(error = %e, "generation worker panicked");
                }
            }
        }
    }
}

async fn run_worker(
    worker: usize,
    queue: TaskQueue,
    results: mpsc::Sender<TaskResult>,
    client: Arc<dyn GenerationClient>,
    call_timeout: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    trace!(worker, "worker started");

    loop {
        if *cancel.borrow() {
            break;
        }

        let task = queue.lock().await.recv().await;
        let Some(task) = task else {
            break;
        };

        let result = match task.static_content() {
            Some(content) => TaskResult::success(&task, content.to_string()),
            None => {
                tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel) => {
                        debug!(worker, path = %task.path(), "call aborted by cancellation");
                        break;
                    }
                    outcome = tokio::time::timeout(
                        call_timeout,
                        client.query(&task.system_prompt, &task.user_prompt),
                    ) => match outcome {
                        Ok(Ok(content)) => TaskResult::success(&task, content),
                        Ok(Err(e)) => TaskResult::failure(&task, e),
                        Err(_) => TaskResult::failure(
                            &task,
                            GenerationError::transient(format!(
                                "request timed out after {}s",
                                call_timeout.as_secs_f32()
                            )),
                        ),
                    },
                }
            }
        };

        trace!(worker, path = %result.path, ok = result.is_success(), "task finished");

        if results.send(result).await.is_err() {
            // Consumer is gone; nobody is left to report to.
            break;
        }
    }

    trace!(worker, "worker exiting");
}

/// Resolves once `cancel` becomes `true`. Never resolves if the sender is
/// dropped without cancelling.
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}
