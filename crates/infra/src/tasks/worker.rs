//! Export task worker for periodic batch processing.
//!
//! Polls the task queue for due export tasks, runs each one once through the
//! [`TaskExecutor`], and records the outcome on the queue. Join handles are
//! tracked and cancellation is explicit. A batch that has started always runs
//! to completion; cancellation is observed between batches. There is no
//! processing timeout because the transport has none.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use course_export_domain::WorkerConfig;
//! use course_export_infra::tasks::{ExportTaskWorker, InMemoryTaskQueue};
//!
//! # async fn example(executor: Arc<dyn course_export_core::TaskExecutor>) -> Result<(), course_export_infra::tasks::WorkerError> {
//! let queue = Arc::new(InMemoryTaskQueue::new());
//! let mut worker = ExportTaskWorker::new(queue, executor, WorkerConfig::default());
//!
//! worker.start()?;
//! // ... application runs ...
//! worker.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

use course_export_core::{TaskExecutor, TaskQueue};
use course_export_domain::constants::MAX_FAILURE_REASON_LEN;
use course_export_domain::{CourseExportError, QueuedTask, WorkerConfig};
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle and bookkeeping failures of the worker itself.
///
/// Export failures are not worker errors: they end up on the failed task.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Worker already running")]
    AlreadyRunning,

    #[error("Worker not running")]
    NotRunning,

    #[error("Worker task panicked: {0}")]
    Panicked(String),

    #[error("Task queue error: {0}")]
    Queue(#[from] CourseExportError),

    #[error("Failed to record task outcome: {0}")]
    Bookkeeping(String),
}

/// Counts for one or more processed batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub claimed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn absorb(&mut self, other: Self) {
        self.claimed += other.claimed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

enum TaskOutcome {
    Succeeded,
    Failed,
    Unrecorded(String),
}

/// Export task worker with explicit lifecycle management.
pub struct ExportTaskWorker {
    queue: Arc<dyn TaskQueue>,
    executor: Arc<dyn TaskExecutor>,
    config: WorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ExportTaskWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        executor: Arc<dyn TaskExecutor>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            executor,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the worker, spawning the background processing task.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<(), WorkerError> {
        if self.is_running() {
            return Err(WorkerError::AlreadyRunning);
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            batch_size = self.config.batch_size,
            concurrency = self.config.concurrency,
            "Starting export task worker"
        );

        self.cancellation = CancellationToken::new();

        let queue = Arc::clone(&self.queue);
        let executor = Arc::clone(&self.executor);
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        self.task_handle = Some(tokio::spawn(async move {
            Self::process_loop(queue, executor, config, cancel).await;
        }));

        Ok(())
    }

    /// Stop the worker and wait for the processing task to finish.
    ///
    /// A batch already in flight always completes: once `join_timeout` has
    /// passed the worker logs that it is still waiting, but never abandons a
    /// request the remote may already have received.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), WorkerError> {
        let Some(mut handle) = self.task_handle.take() else {
            return Err(WorkerError::NotRunning);
        };

        info!("Stopping export task worker");
        self.cancellation.cancel();

        let join_timeout = self.config.join_timeout();
        let joined = match tokio::time::timeout(join_timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    waited_ms = join_timeout.as_millis(),
                    "Export batch still in flight; waiting for it to finish"
                );
                handle.await
            }
        };

        if let Err(e) = joined {
            warn!("Worker task panicked: {}", e);
            return Err(WorkerError::Panicked(e.to_string()));
        }

        info!("Export task worker stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a worker instance is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Process due tasks in the calling task until none are left.
    pub async fn drain(&self) -> Result<BatchSummary, WorkerError> {
        let mut total = BatchSummary::default();
        loop {
            let summary = Self::process_batch(
                &self.queue,
                &self.executor,
                self.config.batch_size,
                self.config.concurrency,
            )
            .await?;
            if summary.claimed == 0 {
                return Ok(total);
            }
            total.absorb(summary);
        }
    }

    async fn process_loop(
        queue: Arc<dyn TaskQueue>,
        executor: Arc<dyn TaskExecutor>,
        config: WorkerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Export task worker loop cancelled");
                    break;
                }
                () = tokio::time::sleep(config.poll_interval()) => {
                    let started = Instant::now();
                    match Self::process_batch(&queue, &executor, config.batch_size, config.concurrency).await {
                        Ok(summary) if summary.claimed > 0 => {
                            info!(
                                claimed = summary.claimed,
                                succeeded = summary.succeeded,
                                failed = summary.failed,
                                elapsed_ms = started.elapsed().as_millis(),
                                "Export batch completed"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Batch processing failed"),
                    }
                }
            }
        }
    }

    /// Claim one batch and run it with bounded concurrency.
    async fn process_batch(
        queue: &Arc<dyn TaskQueue>,
        executor: &Arc<dyn TaskExecutor>,
        batch_size: usize,
        concurrency: usize,
    ) -> Result<BatchSummary, WorkerError> {
        let tasks = queue.dequeue_due(batch_size).await?;

        if tasks.is_empty() {
            debug!("No due export tasks");
            return Ok(BatchSummary::default());
        }

        debug!(count = tasks.len(), "Processing export task batch");
        let claimed = tasks.len();

        let outcomes: Vec<TaskOutcome> = stream::iter(tasks)
            .map(|task| {
                let queue = Arc::clone(queue);
                let executor = Arc::clone(executor);
                async move { Self::run_task(queue.as_ref(), executor.as_ref(), task).await }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let mut summary = BatchSummary { claimed, ..BatchSummary::default() };
        let mut unrecorded = Vec::new();
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Succeeded => summary.succeeded += 1,
                TaskOutcome::Failed => summary.failed += 1,
                TaskOutcome::Unrecorded(msg) => unrecorded.push(msg),
            }
        }

        if !unrecorded.is_empty() {
            return Err(WorkerError::Bookkeeping(unrecorded.join("; ")));
        }

        Ok(summary)
    }

    async fn run_task(
        queue: &dyn TaskQueue,
        executor: &dyn TaskExecutor,
        task: QueuedTask,
    ) -> TaskOutcome {
        match executor.execute(&task).await {
            Ok(()) => {
                debug!(task_id = %task.id, "Export task succeeded");
                match queue.mark_succeeded(task.id).await {
                    Ok(()) => TaskOutcome::Succeeded,
                    Err(err) => {
                        warn!(task_id = %task.id, error = %err, "mark_succeeded failed");
                        TaskOutcome::Unrecorded(format!("mark_succeeded error for {}: {err}", task.id))
                    }
                }
            }
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "Export task failed");
                match queue.mark_failed(task.id, &truncate_reason(&err.to_string())).await {
                    Ok(()) => TaskOutcome::Failed,
                    Err(mark_err) => {
                        warn!(task_id = %task.id, error = %mark_err, "mark_failed failed");
                        TaskOutcome::Unrecorded(format!("mark_failed error for {}: {mark_err}", task.id))
                    }
                }
            }
        }
    }
}

fn truncate_reason(reason: &str) -> String {
    if reason.chars().count() <= MAX_FAILURE_REASON_LEN {
        return reason.to_string();
    }

    let mut truncated =
        reason.chars().take(MAX_FAILURE_REASON_LEN.saturating_sub(3)).collect::<String>();
    truncated.push_str("...");
    truncated
}

impl Drop for ExportTaskWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ExportTaskWorker dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
