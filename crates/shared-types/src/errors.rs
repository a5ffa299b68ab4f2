//! # Error Types
//!
//! Validation errors shared by every crate that accepts domain input.

use thiserror::Error;

/// Input rejected before it reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Contract key must not be empty")]
    EmptyContractKey,

    #[error("Shipment quantity must be positive")]
    ZeroQuantity,

    #[error("Device count must be positive")]
    ZeroDeviceCount,

    #[error("Threshold must be positive")]
    ZeroThreshold,

    #[error("Initial shipped quantity {shipped} exceeds threshold {threshold}")]
    ShippedAboveThreshold { shipped: u64, threshold: u64 },

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}
