//! # Course Export Domain
//!
//! Business domain types for the course completion export.
//!
//! This crate contains:
//! - Completion, export and task data types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Wire-level constants shared by every layer
//!
//! ## Architecture
//! - No dependencies on other course-export crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
