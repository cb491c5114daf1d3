//! Domain constants
//!
//! Values that must stay stable because the remote platform, operators or the
//! host application depend on them.

/// Prefix of every transport-layer failure message.
pub const TRANSPORT_ERROR_PREFIX: &str =
    "There was an error communicating with the remote server. It may be down: ";

/// Maximum number of redirects followed for one export request.
pub const MAX_REDIRECTS: usize = 10;

/// The only HTTP status accepted as a successful export.
pub const SUCCESS_STATUS: u16 = 200;

/// Task kind used for queued course completion exports.
pub const EXPORT_TASK_KIND: &str = "export_completion";

/// Table that stores export records.
pub const EXPORT_RECORD_TABLE: &str = "course_export_records";

/// Human readable name of the export completed event.
pub const EXPORT_COMPLETED_EVENT_NAME: &str = "Export completed";

/// Longest failure reason stored on a failed task.
pub const MAX_FAILURE_REASON_LEN: usize = 256;
