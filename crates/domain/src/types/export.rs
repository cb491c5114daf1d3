//! Export payload and persisted export records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;
use crate::types::events::CompletionEvent;

/// Status reported to the remote platform. Only completions are exported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    #[default]
    Completed,
}

impl_status_conversions!(ExportStatus {
    Completed => "completed",
});

/// Custom data stored on a queued export task.
///
/// Field names match the host's event data so queued rows stay readable for
/// operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTaskData {
    #[serde(rename = "relateduserid")]
    pub related_user_id: i64,
    #[serde(rename = "courseid")]
    pub course_id: i64,
    #[serde(rename = "objectid")]
    pub object_id: i64,
}

impl From<&CompletionEvent> for ExportTaskData {
    fn from(event: &CompletionEvent) -> Self {
        Self {
            related_user_id: event.related_user_id,
            course_id: event.course_id,
            object_id: event.object_id,
        }
    }
}

/// JSON body sent to the remote platform.
///
/// Serialises as `{"courseid": <int>, "userid": <string|null>, "status": "completed"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub courseid: i64,
    /// External identifier of the user; `None` when the directory has no
    /// value, sent as `null`.
    pub userid: Option<String>,
    pub status: ExportStatus,
}

impl ExportPayload {
    pub fn completed(course_id: i64, external_user_id: Option<String>) -> Self {
        Self { courseid: course_id, userid: external_user_id, status: ExportStatus::Completed }
    }
}

/// Export record before it has been assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExportRecord {
    pub user_id: i64,
    pub completion_id: i64,
    pub time_created: DateTime<Utc>,
}

/// Durable proof that a completion was transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: i64,
    pub user_id: i64,
    pub completion_id: i64,
    pub time_created: DateTime<Utc>,
}

impl ExportRecord {
    pub fn from_new(id: i64, record: NewExportRecord) -> Self {
        Self {
            id,
            user_id: record.user_id,
            completion_id: record.completion_id,
            time_created: record.time_created,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn payload_serializes_in_wire_order() {
        let payload = ExportPayload::completed(7, Some("EXT42".to_string()));
        let json = serde_json::to_string(&payload).unwrap();

        assert_eq!(json, r#"{"courseid":7,"userid":"EXT42","status":"completed"}"#);
    }

    #[test]
    fn payload_decodes_to_exactly_three_fields() {
        let json = serde_json::to_string(&ExportPayload::completed(3, None)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert_eq!(object["courseid"], 3);
        assert!(object["userid"].is_null());
        assert_eq!(object["status"], "completed");

        let decoded: ExportPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.status, ExportStatus::Completed);
    }

    #[test]
    fn task_data_keeps_only_event_ids() {
        let event = CompletionEvent { related_user_id: 42, course_id: 7, object_id: 99 };
        let data = ExportTaskData::from(&event);

        assert_eq!(
            serde_json::to_string(&data).unwrap(),
            r#"{"relateduserid":42,"courseid":7,"objectid":99}"#
        );
    }
}
