//! Event Bus
//!
//! Broadcast wrapper every engine service publishes through. Subscribers
//! that lag simply miss events on their own receiver; publication never
//! blocks a booking or a sweep tick.

use tokio::sync::broadcast;

use shared::event::{DomainEvent, EventPayload};

/// Typed domain-event bus.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Publish a payload as a stamped domain event.
    ///
    /// Returns the stamped event. A send error only means there is no
    /// subscriber right now, which is fine.
    pub fn publish(&self, payload: EventPayload) -> DomainEvent {
        let event = DomainEvent::new(payload);
        tracing::trace!(event_type = ?event.event_type, event_id = %event.event_id, "Domain event published");
        let _ = self.tx.send(event.clone());
        event
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::event::{DomainEventType, ReleaseReason};

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(EventPayload::TableReleased {
            table_id: "t1".into(),
            client_label: None,
            occupied_minutes: 90,
            reason: ReleaseReason::Manual,
        });

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.event_type, DomainEventType::TableReleased);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(8);
        let ev = bus.publish(EventPayload::ReservationCancelled {
            reservation_id: "x".into(),
            restaurant_id: "r1".into(),
        });
        assert_eq!(ev.event_type, DomainEventType::ReservationCancelled);
    }
}
