//! # Course Export App
//!
//! Composition root and process entry point.
//!
//! This crate contains:
//! - Application context (dependency injection and lifecycle)
//! - Logging initialisation
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires infra adapters into the core ports

pub mod context;
pub mod utils;

pub use context::*;
