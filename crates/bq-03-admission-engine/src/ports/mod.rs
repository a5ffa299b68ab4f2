//! Ports layer: inbound API and outbound notification dispatch.

pub mod inbound;
pub mod outbound;

pub use inbound::{
    handle_create_shipment, CommandResponse, CreateShipment, ErrorBody, ShipmentAdmissionApi,
};
pub use outbound::{DispatchError, NotificationDispatcher};
