//! Ledger store and transaction ports.

use async_trait::async_trait;
use shared_types::{
    ActorId, Contract, ContractKey, ContractQuery, Notification, Page, Shipment, ShipmentQuery,
    Timestamp,
};

use crate::domain::LedgerResult;

/// A multi-document transaction.
///
/// Staged writes are invisible to other transactions until `commit`.
/// Dropping an uncommitted transaction aborts it.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Read a contract, including this transaction's own staged changes.
    async fn find_contract(&mut self, key: &ContractKey) -> LedgerResult<Option<Contract>>;

    /// Add `quantity` to `batteries_shipped` only if the contract is still
    /// unlocked and the result stays within threshold at write time.
    ///
    /// # Returns
    /// - `Ok(Some(contract))`: the updated contract
    /// - `Ok(None)`: no document matched the predicate
    async fn increment_shipped_within_threshold(
        &mut self,
        key: &ContractKey,
        quantity: u64,
        actor: &ActorId,
        at: Timestamp,
    ) -> LedgerResult<Option<Contract>>;

    /// Set the lock flag, appending `notification` to the contract log.
    ///
    /// Returns `Ok(None)` when the contract does not exist.
    async fn set_locked(
        &mut self,
        key: &ContractKey,
        locked: bool,
        actor: &ActorId,
        at: Timestamp,
        notification: Option<Notification>,
    ) -> LedgerResult<Option<Contract>>;

    /// Append a shipment record.
    async fn insert_shipment(&mut self, shipment: Shipment) -> LedgerResult<()>;

    /// Atomically apply every staged write.
    async fn commit(self) -> LedgerResult<()>;

    /// Discard every staged write.
    async fn abort(self);
}

/// The transactional document store holding contracts and shipments.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    type Transaction: LedgerTransaction + 'static;

    async fn begin(&self) -> LedgerResult<Self::Transaction>;

    /// Insert a new contract. Fails with `ContractExists` on duplicate key.
    async fn insert_contract(&self, contract: Contract) -> LedgerResult<Contract>;

    async fn get_contract(&self, key: &ContractKey) -> LedgerResult<Option<Contract>>;

    async fn list_contracts(&self, query: &ContractQuery) -> LedgerResult<Page<Contract>>;

    /// Shipments newest first.
    async fn list_shipments(&self, query: &ShipmentQuery) -> LedgerResult<Page<Shipment>>;
}
