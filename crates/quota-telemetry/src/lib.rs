//! # Quota Telemetry
//!
//! Observability for the admission runtime.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, human or JSON output
//! - **Metrics**: Prometheus counters and histograms in a process registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quota_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BQ_SERVICE_NAME` | `battery-quota` | Service name attached to startup logs |
//! | `BQ_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `BQ_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `BQ_METRICS_ENABLED` | `true` | Register Prometheus metrics |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, ADMISSIONS,
    ADMISSION_DURATION, EVENTS_BROADCAST, LOCK_CONTENTION, NOTIFICATION_FAILURES,
    UPDATE_CONFLICTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize log subscriber: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initialize logging and, when enabled, the metrics registry.
///
/// Hold the returned guard for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryResult<TelemetryGuard> {
    config.validate()?;

    // Metrics first so early admissions are counted
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        metrics = config.metrics_enabled,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: Option<MetricsHandle>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
