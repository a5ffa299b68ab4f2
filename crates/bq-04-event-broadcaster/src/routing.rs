//! Outcome → (room, event) mapping.

use bq_03_admission_engine::OutcomeEvent;
use shared_bus::{Room, ShipmentEvent};
use shared_types::ShipmentStatus;

use crate::config::BroadcastConfig;

/// Every event an outcome produces with the rooms it is addressed to, in
/// publish order. Each event appears once however many rooms it reaches.
pub fn route(outcome: &OutcomeEvent, config: &BroadcastConfig) -> Vec<(Vec<Room>, ShipmentEvent)> {
    let mut deliveries = Vec::new();
    match outcome {
        OutcomeEvent::Admission(result) => {
            let contract = &result.contract;
            let shipment = &result.shipment;

            deliveries.push((
                vec![Room::Contract(contract.key.clone())],
                ShipmentEvent::ShipmentCreated {
                    contract_key: contract.key.clone(),
                    shipment_id: shipment.id.clone(),
                    quantity: shipment.quantity,
                    status: shipment.status,
                    initiator: shipment.initiator.clone(),
                    batteries_shipped: contract.batteries_shipped,
                    threshold: contract.threshold,
                    contract_status: contract.status(),
                    block_reason: shipment.block_reason.clone(),
                    timestamp: shipment.timestamp,
                },
            ));

            if result.status == ShipmentStatus::Blocked {
                let alert = ShipmentEvent::ThresholdExceeded {
                    contract_key: contract.key.clone(),
                    attempted_quantity: shipment.quantity,
                    projected_total: contract.projected_total(shipment.quantity),
                    batteries_shipped: contract.batteries_shipped,
                    threshold: contract.threshold,
                    device_count: contract.device_count,
                    initiator: shipment.initiator.clone(),
                    timestamp: shipment.timestamp,
                };
                let mut rooms = vec![Room::Global];
                rooms.extend(config.alert_roles.iter().copied().map(Room::Role));
                deliveries.push((rooms, alert));
            }
        }
        OutcomeEvent::LockChanged {
            contract,
            changed_by,
            reason,
            at,
        } => {
            let event = ShipmentEvent::LockChanged {
                contract_key: contract.key.clone(),
                is_locked: contract.is_locked,
                changed_by: changed_by.clone(),
                contract_status: contract.status(),
                reason: reason.clone(),
                timestamp: *at,
            };
            let mut rooms = vec![Room::Contract(contract.key.clone())];
            rooms.extend(config.alert_roles.iter().copied().map(Room::Role));
            deliveries.push((rooms, event));
        }
    }
    deliveries
}
