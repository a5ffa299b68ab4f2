//! # Admission Events
//!
//! Defines every event that flows through the shared bus, and the rooms
//! subscribers join to receive them.
//!
//! Events serialize to the wire shape observers consume:
//!
//! ```json
//! { "event": "shipment:created", "contractKey": "CTR-1", ..., "timestamp": "..." }
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{
    ActorId, ContractKey, ContractStatus, Role, ShipmentStatus, Timestamp,
};
use std::fmt;

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ShipmentEvent {
    /// An admission attempt reached the ledger and produced a shipment
    /// record, approved or blocked.
    #[serde(rename = "shipment:created", rename_all = "camelCase")]
    ShipmentCreated {
        contract_key: ContractKey,
        shipment_id: String,
        quantity: u64,
        status: ShipmentStatus,
        initiator: ActorId,
        batteries_shipped: u64,
        threshold: u64,
        contract_status: ContractStatus,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        block_reason: Option<String>,
        timestamp: Timestamp,
    },

    /// An admission would have pushed the contract past its threshold; the
    /// contract is now locked.
    #[serde(rename = "contract:threshold_exceeded", rename_all = "camelCase")]
    ThresholdExceeded {
        contract_key: ContractKey,
        attempted_quantity: u64,
        projected_total: u64,
        batteries_shipped: u64,
        threshold: u64,
        device_count: u64,
        initiator: ActorId,
        timestamp: Timestamp,
    },

    /// A contract was manually locked or unlocked.
    #[serde(rename = "contract:lock_changed", rename_all = "camelCase")]
    LockChanged {
        contract_key: ContractKey,
        is_locked: bool,
        changed_by: ActorId,
        contract_status: ContractStatus,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        reason: Option<String>,
        timestamp: Timestamp,
    },
}

impl ShipmentEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShipmentCreated { .. } => "shipment:created",
            Self::ThresholdExceeded { .. } => "contract:threshold_exceeded",
            Self::LockChanged { .. } => "contract:lock_changed",
        }
    }

    pub fn contract_key(&self) -> &ContractKey {
        match self {
            Self::ShipmentCreated { contract_key, .. }
            | Self::ThresholdExceeded { contract_key, .. }
            | Self::LockChanged { contract_key, .. } => contract_key,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::ShipmentCreated { timestamp, .. }
            | Self::ThresholdExceeded { timestamp, .. }
            | Self::LockChanged { timestamp, .. } => *timestamp,
        }
    }

    /// JSON payload as sent to observers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A subscription partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum Room {
    /// Everything about one contract.
    Contract(ContractKey),
    /// Alerts addressed to everyone holding a role.
    Role(Role),
    /// System-wide alerts.
    Global,
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Contract(key) => write!(f, "contract:{key}"),
            Room::Role(role) => write!(f, "role:{role}"),
            Room::Global => f.write_str("global"),
        }
    }
}

/// One published event and every room it is addressed to.
///
/// A subscriber joined to several of these rooms still sees the event once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub rooms: Vec<Room>,
    /// Per-bus publish sequence. Orders events from this publisher only.
    pub sequence: u64,
    pub event: ShipmentEvent,
}

/// Filter for subscribing to rooms. An empty filter receives everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub rooms: Vec<Room>,
}

impl EventFilter {
    /// Receive every room.
    #[must_use]
    pub fn all() -> Self {
        Self { rooms: Vec::new() }
    }

    #[must_use]
    pub fn rooms(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    #[must_use]
    pub fn contract(key: ContractKey) -> Self {
        Self::rooms(vec![Room::Contract(key)])
    }

    #[must_use]
    pub fn role(role: Role) -> Self {
        Self::rooms(vec![Room::Role(role)])
    }

    #[must_use]
    pub fn global() -> Self {
        Self::rooms(vec![Room::Global])
    }

    /// Also receive events for `room`.
    #[must_use]
    pub fn join(mut self, room: Room) -> Self {
        if !self.rooms.contains(&room) {
            self.rooms.push(room);
        }
        self
    }

    #[must_use]
    pub fn matches(&self, event: &RoomEvent) -> bool {
        self.rooms.is_empty() || event.rooms.iter().any(|room| self.rooms.contains(room))
    }
}

/// Render a room list for logs, e.g. `global,role:admin`.
pub fn rooms_label(rooms: &[Room]) -> String {
    rooms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
