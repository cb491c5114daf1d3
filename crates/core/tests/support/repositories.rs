//! Mock port implementations for testing
//!
//! Every mock records what it was asked to do so tests can assert on side
//! effects without a database, an HTTP server or an event bus.

#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use course_export_core::{
    CompletionTransport, ExportEventPublisher, ExportRecordRepository, TaskQueue, UserDirectory,
};
use course_export_domain::{
    CourseExportError, DeliveryError, ExportCompletedEvent, NewExportRecord, QueuedTask,
    Result as DomainResult, TaskHandle, TaskId, TaskStatus,
};
use parking_lot::Mutex;

/// Directory backed by a fixed map of user id to external id.
#[derive(Default)]
pub struct MockUserDirectory {
    ids: HashMap<i64, Option<String>>,
}

impl MockUserDirectory {
    pub fn with_user(mut self, user_id: i64, external_id: Option<&str>) -> Self {
        self.ids.insert(user_id, external_id.map(str::to_string));
        self
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn external_id(&self, user_id: i64) -> DomainResult<Option<String>> {
        Ok(self.ids.get(&user_id).cloned().flatten())
    }
}

/// Transport that replays scripted outcomes and succeeds once they run out.
#[derive(Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<(), DeliveryError>>>,
    sent: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn with_outcome(self, outcome: Result<(), DeliveryError>) -> Self {
        self.outcomes.lock().push_back(outcome);
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl CompletionTransport for MockTransport {
    async fn send(&self, payload: &str) -> Result<(), DeliveryError> {
        self.sent.lock().push(payload.to_string());
        self.outcomes.lock().pop_front().unwrap_or(Ok(()))
    }
}

/// Append-only record store assigning sequential ids from 1.
#[derive(Default)]
pub struct MockRecordStore {
    records: Mutex<Vec<NewExportRecord>>,
}

impl MockRecordStore {
    pub fn records(&self) -> Vec<NewExportRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl ExportRecordRepository for MockRecordStore {
    async fn insert(&self, record: &NewExportRecord) -> DomainResult<i64> {
        let mut records = self.records.lock();
        records.push(record.clone());
        Ok(i64::try_from(records.len()).unwrap_or(i64::MAX))
    }
}

/// Event bus that keeps every published event.
#[derive(Default)]
pub struct MockEventPublisher {
    events: Mutex<Vec<ExportCompletedEvent>>,
}

impl MockEventPublisher {
    pub fn events(&self) -> Vec<ExportCompletedEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl ExportEventPublisher for MockEventPublisher {
    async fn publish(&self, event: ExportCompletedEvent) -> DomainResult<()> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Vec-backed queue with the same reschedule semantics as the real one.
#[derive(Default)]
pub struct MockTaskQueue {
    tasks: Mutex<Vec<QueuedTask>>,
}

impl MockTaskQueue {
    pub fn tasks(&self) -> Vec<QueuedTask> {
        self.tasks.lock().clone()
    }

    fn update(&self, id: TaskId, status: TaskStatus, reason: Option<&str>) -> DomainResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| CourseExportError::NotFound(format!("task {id}")))?;
        task.status = status;
        task.last_error = reason.map(str::to_string);
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for MockTaskQueue {
    async fn queue_or_reschedule(&self, task: QueuedTask) -> DomainResult<TaskHandle> {
        let mut tasks = self.tasks.lock();
        if let Some(existing) = tasks
            .iter_mut()
            .find(|queued| queued.status == TaskStatus::Pending && queued.is_equivalent(&task))
        {
            existing.next_run_at = task.next_run_at;
            return Ok(TaskHandle { id: existing.id, rescheduled: true });
        }
        let handle = TaskHandle { id: task.id, rescheduled: false };
        tasks.push(task);
        Ok(handle)
    }

    async fn dequeue_due(&self, limit: usize) -> DomainResult<Vec<QueuedTask>> {
        let now = Utc::now();
        let mut tasks = self.tasks.lock();
        let mut claimed = Vec::new();
        for task in tasks.iter_mut() {
            if claimed.len() == limit {
                break;
            }
            if task.status == TaskStatus::Pending && task.next_run_at <= now {
                task.status = TaskStatus::Running;
                claimed.push(task.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_succeeded(&self, id: TaskId) -> DomainResult<()> {
        self.update(id, TaskStatus::Succeeded, None)
    }

    async fn mark_failed(&self, id: TaskId, reason: &str) -> DomainResult<()> {
        self.update(id, TaskStatus::Failed, Some(reason))
    }

    async fn get(&self, id: TaskId) -> DomainResult<Option<QueuedTask>> {
        Ok(self.tasks.lock().iter().find(|task| task.id == id).cloned())
    }

    async fn pending_count(&self) -> DomainResult<usize> {
        Ok(self.tasks.lock().iter().filter(|task| task.status == TaskStatus::Pending).count())
    }
}
