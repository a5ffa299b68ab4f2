//! Domain layer for the lock client.

pub mod errors;
pub mod token;

pub use errors::{LockError, LockResult};
pub use token::{Acquisition, Extension, LockConfig, LockToken};
