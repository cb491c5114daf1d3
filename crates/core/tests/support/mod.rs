//! Shared test helpers for `course-export-core` integration tests.
//!
//! In-memory implementations of every port so the pipeline tests can focus
//! on behaviour instead of boilerplate.

pub mod repositories;
