use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub assignment_latency_seconds: HistogramVec,
    pub connected_observers: IntGauge,
    pub events_published_total: IntCounterVec,
    pub events_dropped_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Total assignment attempts by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let assignment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of assignment processing in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_latency_seconds metric");

        let connected_observers = IntGauge::new(
            "connected_observers",
            "Current number of subscribed event observers",
        )
        .expect("valid connected_observers metric");

        let events_published_total = IntCounterVec::new(
            Opts::new("events_published_total", "Total events fanned out by kind"),
            &["kind"],
        )
        .expect("valid events_published_total metric");

        let events_dropped_total = IntCounter::new(
            "events_dropped_total",
            "Events dropped because an observer queue was full",
        )
        .expect("valid events_dropped_total metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");
        registry
            .register(Box::new(connected_observers.clone()))
            .expect("register connected_observers");
        registry
            .register(Box::new(events_published_total.clone()))
            .expect("register events_published_total");
        registry
            .register(Box::new(events_dropped_total.clone()))
            .expect("register events_dropped_total");

        Self {
            registry,
            assignments_total,
            assignment_latency_seconds,
            connected_observers,
            events_published_total,
            events_dropped_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
