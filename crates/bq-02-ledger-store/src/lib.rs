//! # Ledger Store
//!
//! **Component:** Ledger Store (bq-02)
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Durable, transactional home of the `Contract` and `Shipment` collections.
//! Every admission runs inside one ledger transaction: nothing it stages is
//! visible until commit, and an abandoned transaction leaves no trace.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | `batteries_shipped <= threshold` | conditional increment, `domain/predicates.rs` |
//! | Locked contracts never change shipped count | same predicate |
//! | No lost update | commit-time version check on every staged contract |
//! | Shipments are append-only | no update/delete path exists |
//! | All-or-nothing commit | staged writes applied under one write lock |
//!
//! ## Transaction Lifecycle
//!
//! ```text
//! begin() ──→ [OPEN] ──stage writes──→ [OPEN] ──commit()──→ [COMMITTED]
//!                │                                  │
//!                └──── abort() / drop ──→ [ABORTED] ←┘ (version conflict)
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{InMemoryLedger, InMemoryTransaction, LedgerStats};
pub use domain::{admits, LedgerError, LedgerResult};
pub use ports::{LedgerStore, LedgerTransaction};
