//! Ports layer for the lock client.
//!
//! - Inbound (Driving): `LockClient`, used by the admission engine
//! - Outbound (Driven): `LockBackend`, the shared key-value store

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
