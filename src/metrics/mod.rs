// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::{configure, ServiceInfo};

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// - Orders created at the gateway
// - Lifecycle transitions produced (per status, counted where emitted)
// - Events applied by the gateway subscriber (per status)
// - Events ignored by the gateway (duplicate / stale)
// - Sidecar collaborator failures
// - Simulated work time per stage
//
// Exposed on every service at /metrics.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub order_transitions: IntCounterVec,
    pub order_events_applied: IntCounterVec,
    pub order_events_ignored: IntCounterVec,
    pub collaborator_failures: IntCounterVec,
    pub simulated_work: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders accepted")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Lifecycle transitions produced"),
            &["event"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let order_events_applied = IntCounterVec::new(
            Opts::new("order_events_applied_total", "Inbound order events applied by the gateway"),
            &["event"],
        )?;
        registry.register(Box::new(order_events_applied.clone()))?;

        let order_events_ignored = IntCounterVec::new(
            Opts::new("order_events_ignored_total", "Inbound order events that were not applied"),
            &["reason"],
        )?;
        registry.register(Box::new(order_events_ignored.clone()))?;

        let collaborator_failures = IntCounterVec::new(
            Opts::new("collaborator_failures_total", "Failed sidecar calls"),
            &["collaborator"],
        )?;
        registry.register(Box::new(collaborator_failures.clone()))?;

        let simulated_work = HistogramVec::new(
            HistogramOpts::new("simulated_work_seconds", "Simulated work per lifecycle stage")
                .buckets(vec![1.0, 3.0, 4.0, 5.0, 6.0, 7.0, 10.0, 30.0]),
            &["stage"],
        )?;
        registry.register(Box::new(simulated_work.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_transitions,
            order_events_applied,
            order_events_ignored,
            collaborator_failures,
            simulated_work,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_created(&self) {
        self.orders_created.inc();
    }

    pub fn record_transition(&self, event: &str) {
        self.order_transitions.with_label_values(&[event]).inc();
    }

    pub fn record_applied(&self, event: &str) {
        self.order_events_applied.with_label_values(&[event]).inc();
    }

    pub fn record_ignored(&self, reason: &str) {
        self.order_events_ignored.with_label_values(&[reason]).inc();
    }

    pub fn record_failure(&self, collaborator: &str) {
        self.collaborator_failures.with_label_values(&[collaborator]).inc();
    }

    pub fn record_work(&self, stage: &str, seconds: f64) {
        self.simulated_work.with_label_values(&[stage]).observe(seconds);
    }
}
