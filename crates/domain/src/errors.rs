//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::TRANSPORT_ERROR_PREFIX;

/// Main error type for course export infrastructure operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CourseExportError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for course export operations
pub type Result<T> = std::result::Result<T, CourseExportError>;

/// Broad classification of a failed HTTP exchange.
///
/// Codes follow libcurl's numbering so operators can keep using the
/// runbooks written for the previous integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    UrlMalformed,
    DnsResolution,
    Connect,
    Timeout,
    Tls,
    TooManyRedirects,
    Send,
    Receive,
    Other,
}

impl TransportErrorKind {
    /// Numeric code reported alongside the description.
    pub fn code(self) -> u32 {
        match self {
            Self::UrlMalformed => 3,
            Self::DnsResolution => 6,
            Self::Connect => 7,
            Self::Timeout => 28,
            Self::Tls => 35,
            Self::TooManyRedirects => 47,
            Self::Send => 55,
            Self::Receive => 56,
            Self::Other => 0,
        }
    }
}

/// The HTTP exchange itself could not be completed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{prefix}{description} (code {code}) {diagnostics}", prefix = TRANSPORT_ERROR_PREFIX, code = .kind.code())]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub description: String,
    pub diagnostics: String,
}

impl TransportError {
    pub fn new(
        kind: TransportErrorKind,
        description: impl Into<String>,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self { kind, description: description.into(), diagnostics: diagnostics.into() }
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }
}

/// The exchange completed but the remote answered with something other than
/// `200`.
///
/// The message wording (typo included) is relied upon by consumers of the
/// previous integration and must not change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error {status}: There following error occured during transfer of data: {body}")]
pub struct HttpStatusError {
    pub status: u16,
    pub body: String,
}

/// Outcome of a failed delivery attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Status(#[from] HttpStatusError),
}

impl DeliveryError {
    /// HTTP status of the response, `None` when no response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(_) => None,
            Self::Status(err) => Some(err.status),
        }
    }
}

/// Error raised by the export orchestrator; the only error the task runner
/// ever sees.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Sending the payload failed. Displays exactly the delivery message.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Invalid export task data: {0}")]
    InvalidTaskData(String),

    #[error("Failed to serialize export payload: {0}")]
    Serialization(String),

    #[error("User directory lookup failed: {0}")]
    Directory(CourseExportError),

    #[error("Failed to persist export record: {0}")]
    Persistence(CourseExportError),

    #[error("Export record {record_id} persisted but the completion event was not published: {source}")]
    Publish { record_id: i64, source: CourseExportError },
}
