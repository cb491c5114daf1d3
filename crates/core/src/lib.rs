//! # Course Export Core
//!
//! Pure business logic of the completion export - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the user directory, transport, record store,
//!   event bus and task queue
//! - The export orchestrator and the response validator
//! - The deferred task wrapper that turns completion events into tasks
//!
//! ## Architecture Principles
//! - Only depends on `course-export-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod export;
pub mod tasks;

// Re-export specific items to avoid ambiguity
pub use export::ports::{
    ApiSettingsSource, CompletionTransport, ExportEventPublisher, ExportRecordRepository,
    UserDirectory,
};
pub use export::service::{build_payload, ExportService};
pub use export::validator::validate_response;
pub use tasks::export_task::{ExportTaskExecutor, ExportTaskScheduler};
pub use tasks::ports::{TaskExecutor, TaskQueue};
