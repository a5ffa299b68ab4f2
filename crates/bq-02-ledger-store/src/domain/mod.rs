//! Domain layer for the ledger store.

pub mod errors;
pub mod predicates;

pub use errors::{LedgerError, LedgerResult};
pub use predicates::admits;
