//! Outbound (Driven) port: the shared low-latency key-value store.
//!
//! Production deployments point this at a store every server process can
//! reach; `InMemoryLockBackend` serves single-process runs and tests.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::LockResult;

/// Atomic primitives the lock client is built on.
#[async_trait]
pub trait LockBackend: Send + Sync {
    /// Store `value` under `key` with expiry `ttl` only if the key is absent
    /// (or its previous entry has expired). Returns whether it was stored.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool>;

    /// Delete `key` only if it currently holds `value`.
    async fn delete_if_equals(&self, key: &str, value: &str) -> LockResult<bool>;

    /// Reset the expiry of `key` to `ttl` only if it currently holds `value`.
    async fn expire_if_equals(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool>;

    /// Current unexpired value of `key`.
    async fn get(&self, key: &str) -> LockResult<Option<String>>;
}
