//! Export orchestrator - core business logic
//!
//! Resolves the user's external identifier, builds the payload, hands it to
//! the transport and, only when delivery succeeded, persists an export record
//! and announces it. A failed delivery leaves no trace besides the returned
//! error.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use course_export_domain::{
    CourseContext, ExportCompletedEvent, ExportError, ExportPayload, ExportRecord, ExportTaskData,
    NewExportRecord,
};
use tracing::{info, instrument, warn};

use super::ports::{CompletionTransport, ExportEventPublisher, ExportRecordRepository, UserDirectory};

/// Export orchestrator
///
/// Holds no mutable state; concurrent exports of different completions are
/// safe as long as the ports are.
pub struct ExportService {
    directory: Arc<dyn UserDirectory>,
    transport: Arc<dyn CompletionTransport>,
    records: Arc<dyn ExportRecordRepository>,
    events: Arc<dyn ExportEventPublisher>,
}

impl ExportService {
    /// Wire the orchestrator to its four ports.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        transport: Arc<dyn CompletionTransport>,
        records: Arc<dyn ExportRecordRepository>,
        events: Arc<dyn ExportEventPublisher>,
    ) -> Self {
        Self { directory, transport, records, events }
    }

    /// Export one course completion.
    ///
    /// Not idempotent: exporting the same data twice sends twice and, on
    /// success, creates two records and two events.
    ///
    /// # Errors
    ///
    /// [`ExportError::Delivery`] when the request could not be completed or
    /// was answered with a status other than `200`; nothing is persisted or
    /// published in that case. Directory, store and event bus failures map to
    /// their own variants.
    #[instrument(
        skip_all,
        fields(
            user_id = data.related_user_id,
            course_id = data.course_id,
            completion_id = data.object_id
        )
    )]
    pub async fn export(&self, data: &ExportTaskData) -> Result<ExportRecord, ExportError> {
        let external_id = self
            .directory
            .external_id(data.related_user_id)
            .await
            .map_err(ExportError::Directory)?;

        if external_id.is_none() {
            warn!("user has no external identifier; exporting a null userid");
        }

        let payload = build_payload(data, external_id);
        info!(
            courseid = payload.courseid,
            userid = ?payload.userid,
            status = %payload.status,
            "export payload prepared"
        );

        let json = serde_json::to_string(&payload)
            .map_err(|err| ExportError::Serialization(err.to_string()))?;

        if let Err(err) = self.transport.send(&json).await {
            warn!(http_status = ?err.status(), error = %err, "export delivery failed");
            return Err(ExportError::Delivery(err));
        }

        let new_record = NewExportRecord {
            user_id: data.related_user_id,
            completion_id: data.object_id,
            time_created: Utc::now().trunc_subsecs(0),
        };
        let id = self.records.insert(&new_record).await.map_err(ExportError::Persistence)?;
        let record = ExportRecord::from_new(id, new_record);

        let event = ExportCompletedEvent::new(
            CourseContext::course(data.course_id),
            record.id,
            data.related_user_id,
            record.time_created,
        );
        self.events
            .publish(event)
            .await
            .map_err(|source| ExportError::Publish { record_id: record.id, source })?;

        info!(record_id = record.id, "course completion exported");
        Ok(record)
    }
}

/// Payload for a completion, with the external id passed through untouched.
pub fn build_payload(data: &ExportTaskData, external_id: Option<String>) -> ExportPayload {
    ExportPayload::completed(data.course_id, external_id)
}
