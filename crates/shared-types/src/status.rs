//! # Derived Contract Status
//!
//! Status is a pure function of the stored fields and is never persisted.
//!
//! ```text
//! [ACTIVE] ──≥80%──→ [WARNING] ──≥100%──→ [EXCEEDED]
//!     │                  │
//!     └──── over-threshold attempt / manual lock ────→ [LOCKED]
//!                                                        │
//!     ←─────────────── manual unlock only ───────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Warning band starts at 80% of the threshold (4/5, integer arithmetic).
const WARNING_NUMERATOR: u64 = 4;
const WARNING_DENOMINATOR: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Active,
    Warning,
    Exceeded,
    Locked,
}

impl ContractStatus {
    pub fn derive(batteries_shipped: u64, threshold: u64, is_locked: bool) -> Self {
        if is_locked {
            return ContractStatus::Locked;
        }
        let shipped = u128::from(batteries_shipped);
        let threshold = u128::from(threshold);
        if shipped >= threshold {
            ContractStatus::Exceeded
        } else if shipped * u128::from(WARNING_DENOMINATOR)
            >= threshold * u128::from(WARNING_NUMERATOR)
        {
            ContractStatus::Warning
        } else {
            ContractStatus::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "ACTIVE",
            ContractStatus::Warning => "WARNING",
            ContractStatus::Exceeded => "EXCEEDED",
            ContractStatus::Locked => "LOCKED",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
