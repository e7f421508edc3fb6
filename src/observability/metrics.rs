//! OpenTelemetry metrics.
//!
//! Key metrics:
//! - spillway_publish_total: Counter of publish calls
//! - spillway_deliveries_total: Counter of topics placed in mailboxes
//! - spillway_delivery_failures_total: Counter of failed deliveries by reason
//! - spillway_subscribers_active: Up/down counter of live subscribers
//!
//! Instruments are bound from the global meter provider, so install the
//! application's provider before calling [`init_metrics`]. Until then every
//! `record_*` call is a no-op.

use opentelemetry::metrics::{Counter, Meter, UpDownCounter};
use opentelemetry::{global, KeyValue};
use std::sync::OnceLock;

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Spillway metrics registry.
#[derive(Debug)]
pub struct Metrics {
    /// Total number of publish calls.
    pub publish_total: Counter<u64>,
    /// Topics accepted into subscriber mailboxes.
    pub deliveries_total: Counter<u64>,
    /// Failed deliveries, labelled with the failure `reason`.
    pub delivery_failures_total: Counter<u64>,
    /// Subscribers currently registered.
    pub subscribers_active: UpDownCounter<i64>,
}

impl Metrics {
    fn new(meter: &Meter) -> Self {
        Self {
            publish_total: meter
                .u64_counter("spillway_publish_total")
                .with_description("Total number of publish calls")
                .with_unit("1")
                .init(),
            deliveries_total: meter
                .u64_counter("spillway_deliveries_total")
                .with_description("Topics accepted into subscriber mailboxes")
                .with_unit("1")
                .init(),
            delivery_failures_total: meter
                .u64_counter("spillway_delivery_failures_total")
                .with_description("Deliveries rejected, by reason")
                .with_unit("1")
                .init(),
            subscribers_active: meter
                .i64_up_down_counter("spillway_subscribers_active")
                .with_description("Subscribers currently registered")
                .with_unit("1")
                .init(),
        }
    }
}

/// Bind instruments from the global meter provider.
///
/// Subsequent calls are ignored.
pub fn init_metrics() {
    METRICS.get_or_init(|| Metrics::new(&global::meter("spillway")));
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Record a publish call that reached `delivered` subscribers.
pub fn record_publish(delivered: usize) {
    if let Some(m) = METRICS.get() {
        m.publish_total.add(1, &[]);
        m.deliveries_total.add(delivered as u64, &[]);
    }
}

/// Record a failed delivery. `reason` is a [`DeliveryError`](crate::DeliveryError) label.
pub fn record_delivery_failure(reason: &'static str) {
    if let Some(m) = METRICS.get() {
        m.delivery_failures_total
            .add(1, &[KeyValue::new("reason", reason)]);
    }
}

pub fn record_subscriber_added() {
    if let Some(m) = METRICS.get() {
        m.subscribers_active.add(1, &[]);
    }
}

pub fn record_subscriber_removed() {
    if let Some(m) = METRICS.get() {
        m.subscribers_active.add(-1, &[]);
    }
}
