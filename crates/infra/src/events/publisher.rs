//! In-process fan-out of export completed events.

use async_trait::async_trait;
use course_export_core::ExportEventPublisher;
use course_export_domain::{ExportCompletedEvent, Result as DomainResult};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Broadcasts every [`ExportCompletedEvent`] to all current subscribers.
///
/// Events published while nobody is subscribed are dropped; slow subscribers
/// lose the oldest events once `capacity` is exceeded.
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<ExportCompletedEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExportCompletedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl ExportEventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: ExportCompletedEvent) -> DomainResult<()> {
        info!(
            event = ExportCompletedEvent::name(),
            record_id = event.object_id,
            user_id = event.related_user_id,
            course_id = event.course_id(),
            "{}",
            event.description()
        );

        if self.sender.send(event).is_err() {
            debug!("no subscribers for export completed event");
        }
        Ok(())
    }
}
