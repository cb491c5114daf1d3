//! # Course Export Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The reqwest completion transport and its HTTP client
//! - SQLite export record store and user directory (r2d2 pool)
//! - In-memory task queue and the export task worker
//! - Event channels and the configuration loader
//!
//! ## Architecture
//! - Implements traits defined in `course-export-core`
//! - Contains all "impure" code (I/O, network, timers)

pub mod config;
pub mod database;
pub mod errors;
pub mod events;
pub mod export;
pub mod http;
pub mod tasks;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use events::{BroadcastEventPublisher, CompletionListener};
pub use export::HttpCompletionTransport;
pub use http::*;
pub use tasks::{ExportTaskWorker, InMemoryTaskQueue};
