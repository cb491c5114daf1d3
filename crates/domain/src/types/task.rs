//! Deferred task model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_status_conversions;

/// Identifier of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a task: `Pending -> Running -> {Succeeded, Failed}`.
///
/// Terminal states never move back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl_status_conversions!(TaskStatus {
    Pending => "pending",
    Running => "running",
    Succeeded => "succeeded",
    Failed => "failed",
});

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// A unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: TaskId,
    pub kind: String,
    /// JSON encoded task input.
    pub custom_data: String,
    pub next_run_at: DateTime<Utc>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl QueuedTask {
    /// New pending task, due immediately.
    pub fn new(kind: impl Into<String>, custom_data: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            kind: kind.into(),
            custom_data: custom_data.into(),
            next_run_at: now,
            status: TaskStatus::Pending,
            created_at: now,
            last_error: None,
        }
    }

    /// Same kind and same input, i.e. re-running one would duplicate the other.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.kind == other.kind && self.custom_data == other.custom_data
    }
}

/// Returned when a task is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    pub id: TaskId,
    /// `true` when an equivalent pending task was found and rescheduled
    /// instead of queueing a new one.
    pub rescheduled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_pending_and_due() {
        let task = QueuedTask::new("export_completion", "{}");

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.next_run_at <= Utc::now());
        assert!(task.last_error.is_none());
    }

    #[test]
    fn equivalence_compares_kind_and_data() {
        let a = QueuedTask::new("export_completion", r#"{"courseid":1}"#);
        let b = QueuedTask::new("export_completion", r#"{"courseid":1}"#);
        let c = QueuedTask::new("export_completion", r#"{"courseid":2}"#);
        let d = QueuedTask::new("other", r#"{"courseid":1}"#);

        assert_ne!(a.id, b.id);
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
        assert!(!a.is_equivalent(&d));
    }

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }
}
