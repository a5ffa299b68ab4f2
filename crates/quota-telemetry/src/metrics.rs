//! Prometheus metrics for the admission runtime.
//!
//! All metrics follow the naming convention: `bq_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., lock_contention_total)
//! - **Histogram**: Distribution of values (e.g., admission_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ADMISSION METRICS
    // =========================================================================

    /// Admission attempts by outcome
    pub static ref ADMISSIONS: CounterVec = CounterVec::new(
        Opts::new("bq_admission_requests_total", "Admission attempts by outcome"),
        &["outcome"]  // outcome: approved/blocked/<error code>
    ).expect("metric creation failed");

    /// End-to-end admission latency, lock acquire through release
    pub static ref ADMISSION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "bq_admission_duration_seconds",
            "Time spent admitting a shipment"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // CONSISTENCY METRICS
    // =========================================================================

    /// Requests turned away because the contract lock was held
    pub static ref LOCK_CONTENTION: Counter = Counter::new(
        "bq_lock_contention_total",
        "Admissions rejected because another holder owned the contract lock"
    ).expect("metric creation failed");

    /// Conditional-write or commit-time conflicts
    pub static ref UPDATE_CONFLICTS: Counter = Counter::new(
        "bq_ledger_update_conflicts_total",
        "Atomic update conflicts detected at write or commit time"
    ).expect("metric creation failed");

    // =========================================================================
    // FAN-OUT METRICS
    // =========================================================================

    /// Events published to rooms
    pub static ref EVENTS_BROADCAST: CounterVec = CounterVec::new(
        Opts::new("bq_events_broadcast_total", "Events published to the room bus"),
        &["event"]
    ).expect("metric creation failed");

    /// Failed notification dispatches
    pub static ref NOTIFICATION_FAILURES: Counter = Counter::new(
        "bq_notification_failures_total",
        "Threshold alerts the dispatcher failed to deliver"
    ).expect("metric creation failed");
}

/// Handle to the registered metrics.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Admission
        Box::new(ADMISSIONS.clone()),
        Box::new(ADMISSION_DURATION.clone()),
        // Consistency
        Box::new(LOCK_CONTENTION.clone()),
        Box::new(UPDATE_CONFLICTS.clone()),
        // Fan-out
        Box::new(EVENTS_BROADCAST.clone()),
        Box::new(NOTIFICATION_FAILURES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
