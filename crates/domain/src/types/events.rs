//! Inbound and outbound events of the export pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{EXPORT_COMPLETED_EVENT_NAME, EXPORT_RECORD_TABLE};
use crate::impl_status_conversions;

/// A user finished a course.
///
/// Deserialised from the host's event data; only the three identifiers the
/// export needs are kept, every other field of the incoming event is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    #[serde(rename = "relateduserid")]
    pub related_user_id: i64,
    #[serde(rename = "courseid")]
    pub course_id: i64,
    /// Id of the host's course completion record.
    #[serde(rename = "objectid")]
    pub object_id: i64,
}

/// Course scope an outbound event is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseContext {
    pub course_id: i64,
}

impl CourseContext {
    /// Context of course `course_id`.
    pub fn course(course_id: i64) -> Self {
        Self { course_id }
    }
}

/// Kind of change an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crud {
    Create,
    Read,
    Update,
    Delete,
}

impl Crud {
    /// Single letter form used in event logs.
    pub fn as_char(self) -> char {
        match self {
            Self::Create => 'c',
            Self::Read => 'r',
            Self::Update => 'u',
            Self::Delete => 'd',
        }
    }
}

/// Educational level of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EduLevel {
    Teaching,
    Participating,
    Other,
}

impl_status_conversions!(EduLevel {
    Teaching => "teaching",
    Participating => "participating",
    Other => "other",
});

/// Published once per persisted export record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportCompletedEvent {
    pub context: CourseContext,
    /// Id of the export record that was created.
    pub object_id: i64,
    pub related_user_id: i64,
    pub time_created: DateTime<Utc>,
}

impl ExportCompletedEvent {
    pub const CRUD: Crud = Crud::Create;
    pub const EDU_LEVEL: EduLevel = EduLevel::Other;
    pub const OBJECT_TABLE: &'static str = EXPORT_RECORD_TABLE;

    /// Event for the record `object_id` created for `related_user_id`.
    pub fn new(
        context: CourseContext,
        object_id: i64,
        related_user_id: i64,
        time_created: DateTime<Utc>,
    ) -> Self {
        Self { context, object_id, related_user_id, time_created }
    }

    /// Display name of the event.
    pub fn name() -> &'static str {
        EXPORT_COMPLETED_EVENT_NAME
    }

    /// Course the completion belongs to.
    pub fn course_id(&self) -> i64 {
        self.context.course_id
    }

    pub fn description(&self) -> String {
        format!(
            "The course completion of course with id '{}' for user with id '{}' was successfully transferred.",
            self.context.course_id, self.related_user_id
        )
    }

    /// Host-relative link to the course the completion belongs to.
    pub fn url(&self) -> String {
        format!("/course/view.php?id={}", self.context.course_id)
    }
}
