//! Outbound delivery of course completions

pub mod transport;

pub use transport::{ConnectionDiagnostics, HttpCompletionTransport};
