use crate::broadcast::EventHub;
use crate::observability::metrics::Metrics;
use crate::store::MemoryStore;

pub struct AppState {
    pub store: MemoryStore,
    pub hub: EventHub,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Self {
        let metrics = Metrics::new();

        Self {
            store: MemoryStore::new(),
            hub: EventHub::new(event_buffer_size, metrics.clone()),
            metrics,
        }
    }
}
