//! Ledger error types.

use shared_types::ContractKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The store could not be reached or refused the operation.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// A staged contract changed underneath the transaction.
    #[error("Write conflict on contract {key}: read version {read}, found {found}")]
    WriteConflict {
        key: ContractKey,
        read: u64,
        found: u64,
    },

    #[error("Contract already exists: {0}")]
    ContractExists(ContractKey),

    #[error("Contract not found: {0}")]
    ContractNotFound(ContractKey),
}

impl LedgerError {
    /// Connectivity-class failures, as opposed to data conflicts.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
