use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::models::event::FleetEvent;
use crate::observability::metrics::Metrics;

/// Owned registry of connected observers. Each observer gets a bounded queue;
/// fan-out never blocks the publisher.
pub struct EventHub {
    observers: DashMap<Uuid, mpsc::Sender<FleetEvent>>,
    queue_capacity: usize,
    metrics: Metrics,
}

#[derive(Debug, Clone, Copy)]
pub struct ObserverHandle {
    id: Uuid,
}

impl EventHub {
    pub fn new(queue_capacity: usize, metrics: Metrics) -> Self {
        Self {
            observers: DashMap::new(),
            queue_capacity,
            metrics,
        }
    }

    pub fn subscribe(&self) -> (ObserverHandle, mpsc::Receiver<FleetEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.observers.insert(id, tx);
        self.metrics
            .connected_observers
            .set(self.observers.len() as i64);

        (ObserverHandle { id }, rx)
    }

    pub fn unsubscribe(&self, handle: &ObserverHandle) {
        self.observers.remove(&handle.id);
        self.metrics
            .connected_observers
            .set(self.observers.len() as i64);
    }

    /// Fans the event out to every observer. A full queue drops the event for
    /// that observer only; a closed receiver is pruned from the registry.
    pub fn publish(&self, event: FleetEvent) {
        self.metrics
            .events_published_total
            .with_label_values(&[event.kind_label()])
            .inc();

        let mut disconnected = Vec::new();
        for entry in self.observers.iter() {
            match entry.value().try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.metrics.events_dropped_total.inc();
                    tracing::debug!(observer_id = %entry.key(), "observer queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => disconnected.push(*entry.key()),
            }
        }

        // Removal happens outside the iteration to avoid holding a shard
        // guard while mutating the map.
        for id in disconnected {
            self.observers.remove(&id);
        }
        self.metrics
            .connected_observers
            .set(self.observers.len() as i64);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::EventHub;
    use crate::models::event::{FleetEvent, SystemEventKind};
    use crate::models::vehicle::GeoPoint;
    use crate::observability::metrics::Metrics;

    fn system_event(message: &str) -> FleetEvent {
        FleetEvent::System {
            kind: SystemEventKind::Assignment,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn fan_out_reaches_every_subscriber() {
        let hub = EventHub::new(8, Metrics::new());
        let (_h1, mut rx1) = hub.subscribe();
        let (_h2, mut rx2) = hub.subscribe();

        hub.publish(system_event("hello"));

        assert!(matches!(rx1.recv().await, Some(FleetEvent::System { .. })));
        assert!(matches!(rx2.recv().await, Some(FleetEvent::System { .. })));
    }

    #[tokio::test]
    async fn disconnected_observer_does_not_block_the_others() {
        let hub = EventHub::new(8, Metrics::new());
        let (_h1, mut rx1) = hub.subscribe();
        let (_h2, rx2) = hub.subscribe();
        let (_h3, mut rx3) = hub.subscribe();

        drop(rx2);
        hub.publish(system_event("still delivered"));

        assert!(rx1.recv().await.is_some());
        assert!(rx3.recv().await.is_some());
        // The dead subscriber was pruned during fan-out.
        assert_eq!(hub.observer_count(), 2);
    }

    #[tokio::test]
    async fn unsubscribe_removes_the_observer() {
        let hub = EventHub::new(8, Metrics::new());
        let (handle, mut rx) = hub.subscribe();
        assert_eq!(hub.observer_count(), 1);

        hub.unsubscribe(&handle);
        assert_eq!(hub.observer_count(), 0);

        hub.publish(system_event("nobody home"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn slow_observer_loses_events_without_stalling_publish() {
        let hub = EventHub::new(2, Metrics::new());
        let (_slow, mut slow_rx) = hub.subscribe();

        for i in 0..5 {
            hub.publish(system_event(&format!("event {i}")));
        }

        // Only the queue capacity worth of events survives; the overflow was
        // dropped rather than blocking publish, and the observer stays
        // subscribed for later events.
        let mut seen = 0;
        while slow_rx.try_recv().is_ok() {
            seen += 1;
        }
        assert_eq!(seen, 2);
        assert_eq!(hub.observer_count(), 1);

        hub.publish(system_event("after the backlog drained"));
        assert!(slow_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = EventHub::new(8, Metrics::new());
        let (_h, mut rx) = hub.subscribe();

        hub.publish(FleetEvent::LocationUpdate {
            vehicle_id: Uuid::from_u128(1),
            location: GeoPoint {
                lat: 52.52,
                lng: 13.405,
            },
            recorded_at: Utc::now(),
        });
        hub.publish(system_event("second"));

        assert!(matches!(
            rx.recv().await,
            Some(FleetEvent::LocationUpdate { .. })
        ));
        assert!(matches!(rx.recv().await, Some(FleetEvent::System { .. })));
    }
}
