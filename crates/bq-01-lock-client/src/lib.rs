//! # Distributed Lock Client
//!
//! **Component:** Lock Client (bq-01)
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Serializes admission work per contract key across every server process.
//! A lock is a random token stored under a namespaced key with an expiry, so
//! a crashed holder can never wedge a contract for longer than its TTL.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | At most one holder per key | `LockBackend::set_if_absent` is atomic |
//! | Crashed holders self-expire | every entry carries a TTL |
//! | Release never removes another holder's token | compare-and-delete on token |
//! | Contention is an outcome, not an error | `Acquisition::Held` |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/memory_backend.rs - InMemoryLockBackend               │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - LockClient trait                          │
//! │  ports/outbound.rs - LockBackend trait                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/   - LockToken, Acquisition, Extension, LockError       │
//! │  service.rs - DistributedLockClient                             │
//! │  guard.rs   - LockGuard (scoped acquisition)                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let client = Arc::new(DistributedLockClient::new(InMemoryLockBackend::new(), LockConfig::default()));
//! match LockGuard::acquire(client, &key, ttl).await? {
//!     Some(guard) => {
//!         // critical section
//!         guard.release().await?;
//!     }
//!     None => { /* held by someone else */ }
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod guard;
pub mod ports;
pub mod service;

pub use adapters::InMemoryLockBackend;
pub use domain::{Acquisition, Extension, LockConfig, LockError, LockResult, LockToken};
pub use guard::LockGuard;
pub use ports::{LockBackend, LockClient};
pub use service::DistributedLockClient;

/// Default key namespace for contract locks.
pub const DEFAULT_KEY_PREFIX: &str = "lock:contract:";

/// Default lock TTL in milliseconds.
pub const DEFAULT_TTL_MS: u64 = 5_000;
