//! # Shared Types Crate
//!
//! This crate contains the ledger entities, identifiers, derived status and
//! query types used across the admission workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Contract` and `Shipment` are defined once here.
//! - **Derived, Not Stored**: `ContractStatus` is always computed from stored fields.
//! - **Append-Only Audit**: `Shipment` has no mutation helpers.

pub mod entities;
pub mod errors;
pub mod query;
pub mod status;

pub use entities::*;
pub use errors::*;
pub use query::*;
pub use status::ContractStatus;
