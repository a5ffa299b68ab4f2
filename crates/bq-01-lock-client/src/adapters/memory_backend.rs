//! In-memory lock backend.
//!
//! Expiry is measured with `tokio::time::Instant` so paused-clock tests can
//! drive TTLs deterministically.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use crate::domain::{LockError, LockResult};
use crate::ports::LockBackend;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Single-process stand-in for the shared key-value store.
pub struct InMemoryLockBackend {
    entries: Mutex<HashMap<String, Entry>>,
    available: AtomicBool,
}

impl InMemoryLockBackend {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) connectivity to the store.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of unexpired entries.
    pub fn live_keys(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    fn check_available(&self) -> LockResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LockError::Unavailable(
                "in-memory lock backend marked unavailable".to_string(),
            ))
        }
    }
}

impl Default for InMemoryLockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockBackend for InMemoryLockBackend {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        trace!(key, "lock entry set");
        Ok(true)
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> LockResult<bool> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.value == value && entry.is_live(now) => {
                entries.remove(key);
                Ok(true)
            }
            Some(entry) if !entry.is_live(now) => {
                // Expired entries are garbage regardless of owner.
                entries.remove(key);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    async fn expire_if_equals(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.value == value && entry.is_live(now) => {
                entry.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, key: &str) -> LockResult<Option<String>> {
        self.check_available()?;
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }
}
