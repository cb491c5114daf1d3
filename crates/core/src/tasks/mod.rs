//! Deferred execution of exports

pub mod export_task;
pub mod ports;
