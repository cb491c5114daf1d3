//! Port interfaces for deferred task execution

use async_trait::async_trait;
use course_export_domain::{ExportError, QueuedTask, Result, TaskHandle, TaskId};

/// Queue of deferred tasks
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Queue `task`, or reschedule an equivalent pending task instead of
    /// adding a duplicate.
    async fn queue_or_reschedule(&self, task: QueuedTask) -> Result<TaskHandle>;

    /// Claim up to `limit` due pending tasks, oldest first, marking them
    /// running
    async fn dequeue_due(&self, limit: usize) -> Result<Vec<QueuedTask>>;

    /// Mark a running task as succeeded
    async fn mark_succeeded(&self, id: TaskId) -> Result<()>;

    /// Mark a running task as failed with a reason
    async fn mark_failed(&self, id: TaskId, reason: &str) -> Result<()>;

    /// Look up a task by id
    async fn get(&self, id: TaskId) -> Result<Option<QueuedTask>>;

    /// Number of tasks waiting to run
    async fn pending_count(&self) -> Result<usize>;
}

/// Runs a claimed task
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Run `task` once; the error is recorded on the failed task.
    async fn execute(&self, task: &QueuedTask) -> std::result::Result<(), ExportError>;
}
