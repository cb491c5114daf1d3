//! Domain types and models

pub mod events;
pub mod export;
pub mod task;

pub use events::{CompletionEvent, CourseContext, Crud, EduLevel, ExportCompletedEvent};
pub use export::{ExportPayload, ExportRecord, ExportStatus, ExportTaskData, NewExportRecord};
pub use task::{QueuedTask, TaskHandle, TaskId, TaskStatus};
