//! Engine configuration.

use bq_01_lock_client::DEFAULT_TTL_MS;
use std::time::Duration;

/// Default bound of the outbound event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Fraction of the lock TTL after which the lease is extended before commit.
pub const DEFAULT_LEASE_CHECK_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionConfig {
    /// TTL requested for every contract lock.
    pub lock_ttl: Duration,
    /// Capacity of the outbound event channel.
    pub event_capacity: usize,
    /// Extend the lock before commit once this fraction of the TTL has elapsed.
    pub lease_check_fraction: f64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            lease_check_fraction: DEFAULT_LEASE_CHECK_FRACTION,
        }
    }
}

impl AdmissionConfig {
    /// Lease age past which the engine extends before committing.
    pub fn lease_check_after(&self) -> Duration {
        self.lock_ttl
            .mul_f64(self.lease_check_fraction.clamp(0.0, 1.0))
    }
}
