//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the outbound `LockBackend` port.

mod memory_backend;

pub use memory_backend::InMemoryLockBackend;
