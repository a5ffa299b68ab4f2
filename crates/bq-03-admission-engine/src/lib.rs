//! # Shipment Admission Engine
//!
//! **Component:** Admission Engine (bq-03)
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Decides, atomically per contract, whether a battery shipment is APPROVED
//! or BLOCKED, records the shipment, and auto-locks the contract the first
//! time a request would push it past its threshold.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | `batteries_shipped <= threshold` | pre-check + conditional increment |
//! | Locked contracts admit nothing | `CONTRACT_LOCKED` before any write |
//! | One admission per contract at a time | distributed lock, no waiting |
//! | Lock released on every path | explicit release + `LockGuard` drop |
//! | Contract update and shipment commit together | one ledger transaction |
//! | Broadcast never undoes a commit | events emitted after commit and release |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - TracingNotificationDispatcher, Mock dispatcher      │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - ShipmentAdmissionApi, CreateShipment        │
//! │  ports/outbound.rs - NotificationDispatcher                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/    - AdmissionResult, OutcomeEvent, AdmissionError      │
//! │  service.rs - AdmissionEngine                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{MockNotificationDispatcher, TracingNotificationDispatcher};
pub use domain::{
    block_reason, AdmissionConfig, AdmissionError, AdmissionResult, EngineResult, ErrorCode,
    OutcomeEvent, ThresholdAlert,
};
pub use ports::{
    handle_create_shipment, CommandResponse, CreateShipment, DispatchError, ErrorBody,
    NotificationDispatcher, ShipmentAdmissionApi,
};
pub use service::{outcome_channel, AdmissionEngine};
