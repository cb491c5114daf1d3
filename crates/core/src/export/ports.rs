//! Port interfaces for the completion export

use async_trait::async_trait;
use course_export_domain::{
    ApiConfig, DeliveryError, ExportCompletedEvent, NewExportRecord, Result,
};

/// Resolves the identifier the remote platform knows a user by
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// External identifier of `user_id`, `None` when the directory holds no
    /// value for the user.
    async fn external_id(&self, user_id: i64) -> Result<Option<String>>;
}

/// Sends one serialized export payload to the remote platform
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Deliver `payload` in a single attempt.
    async fn send(&self, payload: &str) -> std::result::Result<(), DeliveryError>;
}

/// Append-only store of export records
#[async_trait]
pub trait ExportRecordRepository: Send + Sync {
    /// Persist a record and return its new id
    async fn insert(&self, record: &NewExportRecord) -> Result<i64>;
}

/// Outbound event bus
#[async_trait]
pub trait ExportEventPublisher: Send + Sync {
    /// Publish an export completed event
    async fn publish(&self, event: ExportCompletedEvent) -> Result<()>;
}

/// Source of the remote endpoint and token, consulted on every send
pub trait ApiSettingsSource: Send + Sync {
    /// Current endpoint URL and bearer token.
    fn api_settings(&self) -> ApiConfig;
}

impl ApiSettingsSource for ApiConfig {
    fn api_settings(&self) -> ApiConfig {
        self.clone()
    }
}
