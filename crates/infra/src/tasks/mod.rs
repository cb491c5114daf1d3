//! Deferred task execution

pub mod memory_queue;
pub mod worker;

pub use memory_queue::InMemoryTaskQueue;
pub use worker::{BatchSummary, ExportTaskWorker, WorkerError};
