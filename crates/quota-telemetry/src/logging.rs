//! Log subscriber setup.
//!
//! JSON lines carry `timestamp`, `level`, `target`, the message and every
//! structured field, so they can be shipped as-is to a log aggregator.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError, TelemetryResult};

/// Install the global subscriber.
///
/// The filter comes from `config.log_level` alone; `TelemetryConfig::from_env`
/// has already resolved `BQ_LOG_LEVEL` over `RUST_LOG`. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> TelemetryResult<()> {
    let env_filter = log_filter(config)?;

    if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
    } else {
        // Human-readable output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
    }
}

fn log_filter(config: &TelemetryConfig) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
