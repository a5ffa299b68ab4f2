//! Lock client service.
//!
//! Maps contract keys onto backend keys and issues random tokens.

use async_trait::async_trait;
use shared_types::ContractKey;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::{Acquisition, Extension, LockConfig, LockError, LockResult, LockToken};
use crate::ports::{LockBackend, LockClient};

/// `LockClient` over any `LockBackend`.
pub struct DistributedLockClient<B: LockBackend> {
    backend: B,
    config: LockConfig,
}

impl<B: LockBackend> DistributedLockClient<B> {
    pub fn new(backend: B, config: LockConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Backend key for a contract.
    pub fn lock_key(&self, key: &ContractKey) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Whether any unexpired holder exists for `key`.
    pub async fn is_held(&self, key: &ContractKey) -> LockResult<bool> {
        Ok(self.backend.get(&self.lock_key(key)).await?.is_some())
    }
}

#[async_trait]
impl<B: LockBackend> LockClient for DistributedLockClient<B> {
    async fn acquire(&self, key: &ContractKey, ttl: Duration) -> LockResult<Acquisition> {
        if ttl.is_zero() {
            return Err(LockError::InvalidTtl);
        }
        let token = LockToken::generate();
        let lock_key = self.lock_key(key);
        if self
            .backend
            .set_if_absent(&lock_key, token.as_str(), ttl)
            .await?
        {
            debug!(contract_key = %key, ttl_ms = ttl.as_millis() as u64, "Lock acquired");
            Ok(Acquisition::Acquired(token))
        } else {
            debug!(contract_key = %key, "Lock held by another caller");
            Ok(Acquisition::Held)
        }
    }

    async fn release(&self, key: &ContractKey, token: &LockToken) -> LockResult<()> {
        let removed = self
            .backend
            .delete_if_equals(&self.lock_key(key), token.as_str())
            .await?;
        if removed {
            debug!(contract_key = %key, "Lock released");
        } else {
            debug!(contract_key = %key, "Lock already released or expired");
        }
        Ok(())
    }

    async fn extend(
        &self,
        key: &ContractKey,
        token: &LockToken,
        ttl: Duration,
    ) -> LockResult<Extension> {
        if ttl.is_zero() {
            return Err(LockError::InvalidTtl);
        }
        if self
            .backend
            .expire_if_equals(&self.lock_key(key), token.as_str(), ttl)
            .await?
        {
            debug!(contract_key = %key, "Lock extended");
            Ok(Extension::Extended)
        } else {
            warn!(contract_key = %key, "Lock extension refused, token no longer owns key");
            Ok(Extension::Expired)
        }
    }
}
