//! Inbound (Driving) port: the lock API consumed by the admission engine.

use async_trait::async_trait;
use shared_types::ContractKey;
use std::time::Duration;

use crate::domain::{Acquisition, Extension, LockResult, LockToken};

/// Time-bounded mutual exclusion keyed by contract.
#[async_trait]
pub trait LockClient: Send + Sync {
    /// Try once to take the lock. Never waits for a current holder.
    ///
    /// # Returns
    /// - `Ok(Acquisition::Acquired(token))`: caller now holds the key for `ttl`
    /// - `Ok(Acquisition::Held)`: someone else holds it
    /// - `Err(LockError::Unavailable)`: backend unreachable
    async fn acquire(&self, key: &ContractKey, ttl: Duration) -> LockResult<Acquisition>;

    /// Release the lock if `token` still owns it.
    ///
    /// Succeeds when the token already expired or was already released.
    async fn release(&self, key: &ContractKey, token: &LockToken) -> LockResult<()>;

    /// Push the expiry of a still-owned lock out to `ttl` from now.
    async fn extend(
        &self,
        key: &ContractKey,
        token: &LockToken,
        ttl: Duration,
    ) -> LockResult<Extension>;
}
