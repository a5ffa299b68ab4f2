//! # Runtime Configuration
//!
//! Unified configuration for every admission component.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BQ_LOCK_TTL_MS` | `5000` | Contract lock TTL |
//! | `BQ_LOCK_PREFIX` | `lock:contract:` | Lock key namespace |
//! | `BQ_EVENT_CAPACITY` | `1024` | Engine → broadcaster channel bound |
//! | `BQ_LEASE_CHECK_FRACTION` | `0.5` | Extend the lock past this share of its TTL |
//! | `BQ_BUS_CAPACITY` | `1000` | Per-subscriber room bus buffer |
//! | `BQ_ALERT_ROLES` | `admin,manager` | Roles receiving threshold alerts |
//! | `BQ_DEMO_REQUESTS` | `40` | Shipment commands in the demo burst |
//! | `BQ_DEMO_THRESHOLD` | `100` | Threshold of the seeded demo contract |
//!
//! Telemetry variables are documented in `quota-telemetry`.

use bq_01_lock_client::LockConfig;
use bq_03_admission_engine::AdmissionConfig;
use bq_04_event_broadcaster::BroadcastConfig;
use quota_telemetry::TelemetryConfig;
use shared_types::Role;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("lock TTL must be greater than zero")]
    ZeroLockTtl,

    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("lease check fraction must be in (0, 1], got {0}")]
    LeaseFraction(String),
}

/// Demo burst parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub contract_key: String,
    pub device_count: u64,
    pub threshold: u64,
    pub requests: usize,
    /// Largest quantity a single demo command asks for.
    pub max_quantity: u64,
    /// Retries per command on retryable errors.
    pub max_retries: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            contract_key: "DEMO-001".to_string(),
            device_count: 25,
            threshold: 100,
            requests: 40,
            max_quantity: 5,
            max_retries: 20,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub lock: LockConfig,
    pub admission: AdmissionConfig,
    pub broadcast: BroadcastConfig,
    pub telemetry: TelemetryConfig,
    pub demo: DemoConfig,
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|var| std::env::var(var).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Load from an arbitrary variable source. Unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, "BQ_LOCK_TTL_MS")? {
            config.admission.lock_ttl = Duration::from_millis(ms);
        }
        if let Some(prefix) = lookup("BQ_LOCK_PREFIX") {
            config.lock.key_prefix = prefix;
        }
        if let Some(capacity) = parse_var(&lookup, "BQ_EVENT_CAPACITY")? {
            config.admission.event_capacity = capacity;
        }
        if let Some(fraction) = parse_var(&lookup, "BQ_LEASE_CHECK_FRACTION")? {
            config.admission.lease_check_fraction = fraction;
        }
        if let Some(capacity) = parse_var(&lookup, "BQ_BUS_CAPACITY")? {
            config.broadcast.bus_capacity = capacity;
        }
        if let Some(raw) = lookup("BQ_ALERT_ROLES") {
            config.broadcast.alert_roles = parse_roles(&raw)?;
        }
        if let Some(requests) = parse_var(&lookup, "BQ_DEMO_REQUESTS")? {
            config.demo.requests = requests;
        }
        if let Some(threshold) = parse_var(&lookup, "BQ_DEMO_THRESHOLD")? {
            config.demo.threshold = threshold;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admission.lock_ttl.is_zero() {
            return Err(ConfigError::ZeroLockTtl);
        }
        if self.admission.event_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("event channel capacity"));
        }
        if self.broadcast.bus_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("bus capacity"));
        }
        let fraction = self.admission.lease_check_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::LeaseFraction(fraction.to_string()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}

fn parse_roles(raw: &str) -> Result<Vec<Role>, ConfigError> {
    let mut roles = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let role = Role::from_str(part).map_err(|_| ConfigError::InvalidValue {
            var: "BQ_ALERT_ROLES",
            value: raw.to_string(),
        })?;
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    Ok(roles)
}
