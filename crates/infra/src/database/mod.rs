//! Database implementations

pub mod export_record_repository;
pub mod manager;
pub mod user_directory;

pub use export_record_repository::*;
pub use manager::*;
pub use user_directory::*;
