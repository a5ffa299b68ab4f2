//! Ports layer for the ledger store.
//!
//! The admission engine depends only on these traits, so tests and
//! deployments can substitute any transactional document store.

pub mod store;

pub use store::*;
