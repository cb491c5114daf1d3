//! Inbound and outbound event channels

pub mod listener;
pub mod publisher;

pub use listener::{CompletionListener, ListenerError};
pub use publisher::BroadcastEventPublisher;
