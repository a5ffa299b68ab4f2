//! Inbound (Driving) port: the API consumed by the transport layer.
//!
//! Callers are authorized before they reach this port; the engine receives
//! only the resulting `ActorId`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{
    ActorId, Contract, ContractQuery, NewContract, Page, Shipment, ShipmentQuery,
};

use crate::domain::{AdmissionError, AdmissionResult, EngineResult, ErrorCode};

/// Request to admit one shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipment {
    /// Raw key as received; validated by the engine.
    pub contract_key: String,
    pub quantity: u64,
    pub initiator: ActorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CreateShipment {
    pub fn new(contract_key: impl Into<String>, quantity: u64, initiator: ActorId) -> Self {
        Self {
            contract_key: contract_key.into(),
            quantity,
            initiator,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[async_trait]
pub trait ShipmentAdmissionApi: Send + Sync {
    /// Decide and record one shipment atomically.
    ///
    /// # Errors
    /// - `CONCURRENT_OPERATION`: the contract lock is held; nothing written
    /// - `CONTRACT_NOT_FOUND` / `CONTRACT_LOCKED` / `INVALID_REQUEST`: terminal
    /// - `ATOMIC_UPDATE_CONFLICT`: the write lost a race; safe to retry
    /// - `BACKEND_UNAVAILABLE`: lock service or ledger unreachable
    async fn admit_shipment(&self, command: CreateShipment) -> EngineResult<AdmissionResult>;

    /// Manually lock or unlock a contract.
    ///
    /// Returns the contract after the change. Requesting the current state
    /// is a successful no-op.
    async fn set_contract_lock(
        &self,
        contract_key: &str,
        locked: bool,
        actor: ActorId,
        reason: Option<String>,
    ) -> EngineResult<Contract>;

    async fn create_contract(&self, new: NewContract, actor: ActorId) -> EngineResult<Contract>;

    async fn contract(&self, contract_key: &str) -> EngineResult<Contract>;

    async fn list_contracts(&self, query: ContractQuery) -> EngineResult<Page<Contract>>;

    /// Shipments newest first.
    async fn list_shipments(&self, query: ShipmentQuery) -> EngineResult<Page<Shipment>>;
}

/// Error half of a command response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl From<&AdmissionError> for ErrorBody {
    fn from(err: &AdmissionError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// JSON envelope returned to command callers.
///
/// `{"success": true, "data": ...}` or
/// `{"success": false, "error": {"code", "message", "retryable"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> CommandResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(err: &AdmissionError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.into()),
        }
    }
}

impl<T> From<EngineResult<T>> for CommandResponse<T> {
    fn from(result: EngineResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::err(&err),
        }
    }
}

/// Run a `CreateShipment` command and wrap the outcome for the wire.
pub async fn handle_create_shipment<A>(
    api: &A,
    command: CreateShipment,
) -> CommandResponse<AdmissionResult>
where
    A: ShipmentAdmissionApi + ?Sized,
{
    api.admit_shipment(command).await.into()
}
