//! # Core Domain Entities
//!
//! Defines the ledger entities tracked by the admission controller.
//!
//! ## Clusters
//!
//! - **Identity**: `ContractKey`, `ActorId`, `Role`
//! - **Ledger**: `Contract`, `Shipment`, `Notification`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::status::ContractStatus;

/// Wall-clock timestamp used on every persisted record.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Human-assigned unique key of a contract (e.g. `"CTR-2024-001"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractKey(String);

impl ContractKey {
    /// Parse a contract key, trimming surrounding whitespace.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyContractKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of an already-authenticated actor.
///
/// The admission core never re-checks permissions; it only records who
/// initiated or modified something.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Actor used for records written by the system itself.
    pub fn system() -> Self {
        Self("system".to_string())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role an observer subscribes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Operator,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Operator => "operator",
            Role::Viewer => "viewer",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "operator" => Ok(Role::Operator),
            "viewer" => Ok(Role::Viewer),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CLUSTER B: LEDGER
// =============================================================================

/// Category of an entry in a contract's notification log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    ThresholdExceeded,
    ContractLocked,
    ContractUnlocked,
}

/// One audit entry in a contract's notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient: ActorId,
    pub message: String,
    pub category: NotificationCategory,
    pub timestamp: Timestamp,
}

/// A quota-bounded shipping agreement.
///
/// `batteries_shipped` never exceeds `threshold`; once `is_locked` is set it
/// does not move until an explicit unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// Internal identity, stable for the life of the record.
    pub id: Uuid,
    pub key: ContractKey,
    pub device_count: u64,
    pub batteries_shipped: u64,
    pub threshold: u64,
    pub is_locked: bool,
    pub last_updated: Timestamp,
    pub notifications: Vec<Notification>,
    pub created_by: ActorId,
    pub last_modified_by: ActorId,
    /// Storage version, bumped on every committed mutation.
    pub version: u64,
}

impl Contract {
    /// Derived status. Never stored.
    pub fn status(&self) -> ContractStatus {
        ContractStatus::derive(self.batteries_shipped, self.threshold, self.is_locked)
    }

    /// Units still admissible before the threshold is reached.
    pub fn remaining(&self) -> u64 {
        self.threshold.saturating_sub(self.batteries_shipped)
    }

    /// Total the contract would reach if `quantity` more units shipped.
    /// Saturates at `u64::MAX`, which is over any threshold.
    pub fn projected_total(&self, quantity: u64) -> u64 {
        self.batteries_shipped.saturating_add(quantity)
    }
}

/// Parameters for creating a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub key: ContractKey,
    pub device_count: u64,
    pub threshold: u64,
    #[serde(default)]
    pub batteries_shipped: u64,
    #[serde(default)]
    pub is_locked: bool,
}

impl NewContract {
    pub fn new(key: ContractKey, device_count: u64, threshold: u64) -> Self {
        Self {
            key,
            device_count,
            threshold,
            batteries_shipped: 0,
            is_locked: false,
        }
    }

    /// Start from an already-shipped quantity (migrated contracts).
    pub fn with_shipped(mut self, batteries_shipped: u64) -> Self {
        self.batteries_shipped = batteries_shipped;
        self
    }

    /// Create the contract pre-locked.
    pub fn locked(mut self) -> Self {
        self.is_locked = true;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.device_count == 0 {
            return Err(ValidationError::ZeroDeviceCount);
        }
        if self.threshold == 0 {
            return Err(ValidationError::ZeroThreshold);
        }
        if self.batteries_shipped > self.threshold {
            return Err(ValidationError::ShippedAboveThreshold {
                shipped: self.batteries_shipped,
                threshold: self.threshold,
            });
        }
        Ok(())
    }

    /// Materialize the persisted record.
    pub fn into_contract(self, actor: ActorId, now: Timestamp) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            key: self.key,
            device_count: self.device_count,
            batteries_shipped: self.batteries_shipped,
            threshold: self.threshold,
            is_locked: self.is_locked,
            last_updated: now,
            notifications: Vec::new(),
            created_by: actor.clone(),
            last_modified_by: actor,
            version: 0,
        }
    }
}

/// Outcome recorded on a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Approved,
    Blocked,
    Pending,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Approved => "APPROVED",
            ShipmentStatus::Blocked => "BLOCKED",
            ShipmentStatus::Pending => "PENDING",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record of one admission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    pub contract_key: ContractKey,
    pub contract_id: Uuid,
    pub quantity: u64,
    pub status: ShipmentStatus,
    pub timestamp: Timestamp,
    pub initiator: ActorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Shipment {
    /// Build a shipment record for `contract` with a fresh identity.
    pub fn record(
        contract: &Contract,
        quantity: u64,
        status: ShipmentStatus,
        initiator: ActorId,
        block_reason: Option<String>,
        note: Option<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            contract_key: contract.key.clone(),
            contract_id: contract.id,
            quantity,
            status,
            timestamp,
            initiator,
            block_reason,
            note,
        }
    }
}
