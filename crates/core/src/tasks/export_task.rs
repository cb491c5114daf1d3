//! Deferred task wrapper for course completion exports
//!
//! Scheduling keeps only the three identifiers the export needs and leaves
//! de-duplication to the queue. Execution decodes them again and delegates to
//! [`ExportService`]; errors are returned to the task runner untouched.

use std::sync::Arc;

use async_trait::async_trait;
use course_export_domain::constants::EXPORT_TASK_KIND;
use course_export_domain::{
    CompletionEvent, CourseExportError, ExportError, ExportRecord, ExportTaskData, QueuedTask,
    Result, TaskHandle,
};
use tracing::{debug, instrument};

use super::ports::{TaskExecutor, TaskQueue};
use crate::export::service::ExportService;

/// Turns completion events into queued export tasks.
pub struct ExportTaskScheduler {
    queue: Arc<dyn TaskQueue>,
}

impl ExportTaskScheduler {
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }

    /// Build the task for `event` without queueing it.
    pub fn build_task(event: &CompletionEvent) -> Result<QueuedTask> {
        let data = ExportTaskData::from(event);
        let custom_data = serde_json::to_string(&data).map_err(|err| {
            CourseExportError::Internal(format!("failed to encode export task data: {err}"))
        })?;
        Ok(QueuedTask::new(EXPORT_TASK_KIND, custom_data))
    }

    /// Queue (or reschedule) the export of one completion.
    #[instrument(
        skip_all,
        fields(
            user_id = event.related_user_id,
            course_id = event.course_id,
            completion_id = event.object_id
        )
    )]
    pub async fn schedule(&self, event: &CompletionEvent) -> Result<TaskHandle> {
        let task = Self::build_task(event)?;
        let handle = self.queue.queue_or_reschedule(task).await?;
        debug!(task_id = %handle.id, rescheduled = handle.rescheduled, "export task scheduled");
        Ok(handle)
    }
}

/// Executes export tasks claimed by a worker.
pub struct ExportTaskExecutor {
    service: Arc<ExportService>,
}

impl ExportTaskExecutor {
    pub fn new(service: Arc<ExportService>) -> Self {
        Self { service }
    }

    /// Decode the stored task data and run the export.
    pub async fn run(&self, task: &QueuedTask) -> std::result::Result<ExportRecord, ExportError> {
        if task.kind != EXPORT_TASK_KIND {
            return Err(ExportError::InvalidTaskData(format!(
                "unsupported task kind '{}'",
                task.kind
            )));
        }

        let data: ExportTaskData = serde_json::from_str(&task.custom_data)
            .map_err(|err| ExportError::InvalidTaskData(err.to_string()))?;

        self.service.export(&data).await
    }
}

#[async_trait]
impl TaskExecutor for ExportTaskExecutor {
    async fn execute(&self, task: &QueuedTask) -> std::result::Result<(), ExportError> {
        self.run(task).await.map(|_| ())
    }
}
