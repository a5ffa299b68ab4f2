//! Telemetry configuration from environment variables.

use std::env;

use crate::{TelemetryError, TelemetryResult};

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or a full EnvFilter)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to register Prometheus metrics
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "battery-quota".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BQ_SERVICE_NAME`: Service name (default: battery-quota)
    /// - `BQ_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `BQ_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `BQ_METRICS_ENABLED`: Register Prometheus metrics (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("BQ_SERVICE_NAME")
                .unwrap_or_else(|_| "battery-quota".to_string()),

            log_level: env::var("BQ_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("BQ_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            metrics_enabled: env::var("BQ_METRICS_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    pub fn validate(&self) -> TelemetryResult<()> {
        if self.log_level.trim().is_empty() {
            return Err(TelemetryError::Config("log level must not be empty".into()));
        }
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::Config(
                "service name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
