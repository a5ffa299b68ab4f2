//! Lock client error types.
//!
//! Contention is deliberately absent: a held lock is reported as
//! `Acquisition::Held`, not as an error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The lock backend could not be reached.
    #[error("Lock backend unavailable: {0}")]
    Unavailable(String),

    /// A zero TTL would create a lock that is expired on arrival.
    #[error("Lock TTL must be positive")]
    InvalidTtl,
}

pub type LockResult<T> = Result<T, LockError>;
