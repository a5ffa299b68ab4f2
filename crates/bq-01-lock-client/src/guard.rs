//! Scoped lock acquisition.
//!
//! `LockGuard::release` is the normal exit. A guard dropped without release
//! (panic, cancelled future, early `?`) hands the release to the current
//! Tokio runtime so the key is freed before its TTL wherever possible.

use shared_types::ContractKey;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{Acquisition, Extension, LockResult, LockToken};
use crate::ports::LockClient;

pub struct LockGuard<C: LockClient + ?Sized + 'static> {
    client: Arc<C>,
    key: ContractKey,
    token: LockToken,
    ttl: Duration,
    renewed_at: Instant,
    released: bool,
}

impl<C: LockClient + ?Sized + 'static> LockGuard<C> {
    /// Try to take the lock. `Ok(None)` means another caller holds it.
    pub async fn acquire(
        client: Arc<C>,
        key: &ContractKey,
        ttl: Duration,
    ) -> LockResult<Option<Self>> {
        match client.acquire(key, ttl).await? {
            Acquisition::Acquired(token) => Ok(Some(Self {
                client,
                key: key.clone(),
                token,
                ttl,
                renewed_at: Instant::now(),
                released: false,
            })),
            Acquisition::Held => Ok(None),
        }
    }

    pub fn key(&self) -> &ContractKey {
        &self.key
    }

    pub fn token(&self) -> &LockToken {
        &self.token
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time since acquisition or the last successful extension.
    pub fn lease_age(&self) -> Duration {
        self.renewed_at.elapsed()
    }

    /// Renew the lease for another full TTL.
    pub async fn extend(&mut self) -> LockResult<Extension> {
        let outcome = self.client.extend(&self.key, &self.token, self.ttl).await?;
        if outcome == Extension::Extended {
            self.renewed_at = Instant::now();
        }
        Ok(outcome)
    }

    /// Release the lock. Idempotent at the backend.
    pub async fn release(mut self) -> LockResult<()> {
        self.released = true;
        self.client.release(&self.key, &self.token).await
    }
}

impl<C: LockClient + ?Sized + 'static> Drop for LockGuard<C> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let client = Arc::clone(&self.client);
        let key = self.key.clone();
        let token = self.token.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(contract_key = %key, "Lock guard dropped unreleased, releasing in background");
                handle.spawn(async move {
                    if let Err(e) = client.release(&key, &token).await {
                        warn!(contract_key = %key, error = %e, "Background lock release failed");
                    }
                });
            }
            Err(_) => {
                warn!(contract_key = %key, "Lock guard dropped outside runtime, lock will expire by TTL");
            }
        }
    }
}
