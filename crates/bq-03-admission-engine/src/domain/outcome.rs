//! Admission outcomes and the events derived from them.

use serde::{Deserialize, Serialize};
use shared_types::{ActorId, Contract, ContractKey, Shipment, ShipmentStatus, Timestamp};

/// Result of one admission decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResult {
    pub status: ShipmentStatus,
    pub shipment: Shipment,
    /// Contract as committed by this admission.
    pub contract: Contract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AdmissionResult {
    pub fn is_approved(&self) -> bool {
        self.status == ShipmentStatus::Approved
    }
}

/// Message from the engine to the broadcaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeEvent {
    /// A committed admission, APPROVED or BLOCKED.
    Admission(AdmissionResult),
    /// A committed manual lock or unlock.
    LockChanged {
        contract: Contract,
        changed_by: ActorId,
        reason: Option<String>,
        at: Timestamp,
    },
}

impl OutcomeEvent {
    pub fn contract_key(&self) -> &ContractKey {
        match self {
            OutcomeEvent::Admission(result) => &result.contract.key,
            OutcomeEvent::LockChanged { contract, .. } => &contract.key,
        }
    }
}

/// Payload handed to the notification dispatcher once per BLOCKED outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdAlert {
    pub contract_key: ContractKey,
    pub attempted_quantity: u64,
    /// Total the contract would have reached had the shipment been admitted.
    pub resulting_total: u64,
    pub threshold: u64,
    pub device_count: u64,
    pub initiator: ActorId,
    /// Contract owner, the recipient of the alert.
    pub recipient: ActorId,
}

impl ThresholdAlert {
    /// Build the alert for a blocked admission against `contract`.
    pub fn for_blocked(contract: &Contract, attempted_quantity: u64, initiator: ActorId) -> Self {
        Self {
            contract_key: contract.key.clone(),
            attempted_quantity,
            resulting_total: contract.projected_total(attempted_quantity),
            threshold: contract.threshold,
            device_count: contract.device_count,
            initiator,
            recipient: contract.created_by.clone(),
        }
    }
}

/// Human-readable reason recorded on a BLOCKED shipment.
pub fn block_reason(contract: &Contract, quantity: u64) -> String {
    format!(
        "Threshold exceeded: {projected}/{threshold} batteries \
         (requested {quantity}, already shipped {shipped}); contract locked for review",
        projected = contract.projected_total(quantity),
        threshold = contract.threshold,
        shipped = contract.batteries_shipped,
    )
}
