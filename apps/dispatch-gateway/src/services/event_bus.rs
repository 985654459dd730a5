//! In-process publish/subscribe for domain events (spec §4.L). Publishers
//! never block on subscribers; a lagging or dropped subscriber never
//! prevents another from receiving.

use dispatch_domain_models::DomainEvent;
use tokio::sync::broadcast;
use tracing::{trace, warn};

const CHANNEL_CAPACITY: usize = 4096;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: DomainEvent) {
        match self.sender.send(event) {
            Ok(subscriber_count) => trace!(subscriber_count, "event published"),
            Err(_) => warn!("event bus has no subscribers; event dropped"),
        }
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
