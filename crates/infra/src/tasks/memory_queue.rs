//! In-process task queue.
//!
//! Tasks live only as long as the process; a restart loses whatever was still
//! pending. Finished tasks leave the live list as soon as their outcome is
//! recorded and only the most recent ones are kept for inspection.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use course_export_core::TaskQueue;
use course_export_domain::{
    CourseExportError, QueuedTask, Result as DomainResult, TaskHandle, TaskId, TaskStatus,
};
use parking_lot::Mutex;
use tracing::debug;

/// Finished tasks retained by [`InMemoryTaskQueue::new`].
pub const DEFAULT_FINISHED_HISTORY: usize = 100;

#[derive(Default)]
struct QueueState {
    /// Pending and running tasks in insertion order.
    live: Vec<QueuedTask>,
    /// Most recently finished tasks, oldest first.
    finished: VecDeque<QueuedTask>,
}

/// Task queue kept in insertion order behind a mutex.
pub struct InMemoryTaskQueue {
    state: Mutex<QueueState>,
    history: usize,
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskQueue {
    /// Queue keeping [`DEFAULT_FINISHED_HISTORY`] finished tasks.
    pub fn new() -> Self {
        Self::with_history(DEFAULT_FINISHED_HISTORY)
    }

    /// Queue that keeps at most `history` finished tasks.
    pub fn with_history(history: usize) -> Self {
        Self { state: Mutex::new(QueueState::default()), history }
    }

    /// Finished tasks still retained, followed by live ones.
    pub fn snapshot(&self) -> Vec<QueuedTask> {
        let state = self.state.lock();
        state.finished.iter().chain(state.live.iter()).cloned().collect()
    }

    fn finish(&self, id: TaskId, status: TaskStatus, reason: Option<&str>) -> DomainResult<()> {
        let mut state = self.state.lock();

        let Some(index) = state.live.iter().position(|task| task.id == id) else {
            return match state.finished.iter().find(|task| task.id == id) {
                Some(task) => Err(CourseExportError::InvalidInput(format!(
                    "task {id} is {}, expected running",
                    task.status
                ))),
                None => Err(CourseExportError::NotFound(format!("task {id}"))),
            };
        };

        if state.live[index].status != TaskStatus::Running {
            return Err(CourseExportError::InvalidInput(format!(
                "task {id} is {}, expected running",
                state.live[index].status
            )));
        }

        let mut task = state.live.remove(index);
        task.status = status;
        task.last_error = reason.map(str::to_string);

        if self.history == 0 {
            return Ok(());
        }
        if state.finished.len() == self.history {
            state.finished.pop_front();
        }
        state.finished.push_back(task);
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn queue_or_reschedule(&self, task: QueuedTask) -> DomainResult<TaskHandle> {
        let mut state = self.state.lock();

        if let Some(existing) = state
            .live
            .iter_mut()
            .find(|queued| queued.status == TaskStatus::Pending && queued.is_equivalent(&task))
        {
            existing.next_run_at = task.next_run_at;
            debug!(task_id = %existing.id, kind = %existing.kind, "rescheduled equivalent task");
            return Ok(TaskHandle { id: existing.id, rescheduled: true });
        }

        let handle = TaskHandle { id: task.id, rescheduled: false };
        state.live.push(task);
        Ok(handle)
    }

    async fn dequeue_due(&self, limit: usize) -> DomainResult<Vec<QueuedTask>> {
        let now = Utc::now();
        let mut state = self.state.lock();

        let claimed: Vec<QueuedTask> = state
            .live
            .iter_mut()
            .filter(|task| task.status == TaskStatus::Pending && task.next_run_at <= now)
            .take(limit)
            .map(|task| {
                task.status = TaskStatus::Running;
                task.clone()
            })
            .collect();

        Ok(claimed)
    }

    async fn mark_succeeded(&self, id: TaskId) -> DomainResult<()> {
        self.finish(id, TaskStatus::Succeeded, None)
    }

    async fn mark_failed(&self, id: TaskId, reason: &str) -> DomainResult<()> {
        self.finish(id, TaskStatus::Failed, Some(reason))
    }

    async fn get(&self, id: TaskId) -> DomainResult<Option<QueuedTask>> {
        let state = self.state.lock();
        Ok(state.live.iter().chain(state.finished.iter()).find(|task| task.id == id).cloned())
    }

    async fn pending_count(&self) -> DomainResult<usize> {
        Ok(self.state.lock().live.iter().filter(|task| task.status == TaskStatus::Pending).count())
    }
}
