//! Completion export: ports, orchestration and response validation

pub mod ports;
pub mod service;
pub mod validator;
