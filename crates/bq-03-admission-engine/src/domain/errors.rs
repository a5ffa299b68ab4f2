//! Admission error taxonomy.
//!
//! | Code | Class | Retry |
//! |------|-------|-------|
//! | `CONCURRENT_OPERATION` | contention | yes |
//! | `ATOMIC_UPDATE_CONFLICT` | consistency conflict | yes |
//! | `CONTRACT_NOT_FOUND` | policy | no |
//! | `CONTRACT_LOCKED` | policy | no |
//! | `CONTRACT_EXISTS` | policy | no |
//! | `INVALID_REQUEST` | policy | no |
//! | `BACKEND_UNAVAILABLE` | infrastructure | not immediately |

use bq_01_lock_client::LockError;
use bq_02_ledger_store::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::{ContractKey, ValidationError};
use std::fmt;
use thiserror::Error;

/// Stable, client-facing error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConcurrentOperation,
    ContractNotFound,
    ContractLocked,
    AtomicUpdateConflict,
    BackendUnavailable,
    InvalidRequest,
    ContractExists,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConcurrentOperation => "CONCURRENT_OPERATION",
            ErrorCode::ContractNotFound => "CONTRACT_NOT_FOUND",
            ErrorCode::ContractLocked => "CONTRACT_LOCKED",
            ErrorCode::AtomicUpdateConflict => "ATOMIC_UPDATE_CONFLICT",
            ErrorCode::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::ContractExists => "CONTRACT_EXISTS",
        }
    }

    /// Whether an immediate retry of the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::ConcurrentOperation | ErrorCode::AtomicUpdateConflict
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("Another operation is in progress for contract {0}; retry shortly")]
    ConcurrentOperation(ContractKey),

    #[error("Contract not found: {0}")]
    ContractNotFound(ContractKey),

    #[error("Contract {0} is locked pending manual review")]
    ContractLocked(ContractKey),

    #[error("Atomic update conflict on contract {key}: {detail}")]
    AtomicUpdateConflict { key: ContractKey, detail: String },

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("Contract already exists: {0}")]
    ContractExists(ContractKey),
}

impl AdmissionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AdmissionError::ConcurrentOperation(_) => ErrorCode::ConcurrentOperation,
            AdmissionError::ContractNotFound(_) => ErrorCode::ContractNotFound,
            AdmissionError::ContractLocked(_) => ErrorCode::ContractLocked,
            AdmissionError::AtomicUpdateConflict { .. } => ErrorCode::AtomicUpdateConflict,
            AdmissionError::BackendUnavailable(_) => ErrorCode::BackendUnavailable,
            AdmissionError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            AdmissionError::ContractExists(_) => ErrorCode::ContractExists,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

impl From<LockError> for AdmissionError {
    fn from(err: LockError) -> Self {
        AdmissionError::BackendUnavailable(err.to_string())
    }
}

impl From<LedgerError> for AdmissionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unavailable(detail) => AdmissionError::BackendUnavailable(detail),
            LedgerError::WriteConflict { key, read, found } => {
                AdmissionError::AtomicUpdateConflict {
                    key,
                    detail: format!(
                        "contract changed during transaction (read v{read}, found v{found})"
                    ),
                }
            }
            LedgerError::ContractExists(key) => AdmissionError::ContractExists(key),
            LedgerError::ContractNotFound(key) => AdmissionError::ContractNotFound(key),
        }
    }
}

pub type EngineResult<T> = Result<T, AdmissionError>;
