//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the `LedgerStore` port.

mod memory;

pub use memory::{InMemoryLedger, InMemoryTransaction, LedgerStats};
