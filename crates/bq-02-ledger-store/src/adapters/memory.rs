//! In-memory transactional ledger.
//!
//! Transactions track the version of every contract they read and stage
//! writes privately. Commit re-validates those versions under the write lock
//! and applies everything or nothing, the same optimistic scheme a document
//! store uses to surface transient write conflicts.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    ActorId, Contract, ContractKey, ContractQuery, Notification, Page, Shipment, ShipmentQuery,
    Timestamp,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::domain::{admits, LedgerError, LedgerResult};
use crate::ports::{LedgerStore, LedgerTransaction};

#[derive(Default)]
struct LedgerState {
    contracts: BTreeMap<ContractKey, Contract>,
    /// Commit order.
    shipments: Vec<Shipment>,
}

/// Switches for simulating backend failure.
#[derive(Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_commit: AtomicBool,
    op_latency_us: AtomicU64,
}

/// Transaction counters.
#[derive(Default)]
struct Counters {
    begun: AtomicU64,
    committed: AtomicU64,
    aborted: AtomicU64,
}

/// Snapshot of transaction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub begun: u64,
    pub committed: u64,
    pub aborted: u64,
}

struct Shared {
    state: RwLock<LedgerState>,
    faults: Faults,
    counters: Counters,
}

impl Shared {
    fn check_available(&self) -> LedgerResult<()> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            Err(LedgerError::Unavailable(
                "in-memory ledger marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    async fn io(&self) -> LedgerResult<()> {
        let micros = self.faults.op_latency_us.load(Ordering::Relaxed);
        if micros > 0 {
            tokio::time::sleep(Duration::from_micros(micros)).await;
        }
        self.check_available()
    }
}

/// Single-process ledger. Cloning shares the same data.
#[derive(Clone)]
pub struct InMemoryLedger {
    shared: Arc<Shared>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(LedgerState::default()),
                faults: Faults::default(),
                counters: Counters::default(),
            }),
        }
    }

    /// Simulate losing (or regaining) connectivity to the store.
    pub fn set_available(&self, available: bool) {
        self.shared
            .faults
            .unavailable
            .store(!available, Ordering::SeqCst);
    }

    /// Make every commit fail as if the process died mid-commit.
    pub fn set_fail_commit(&self, fail: bool) {
        self.shared.faults.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Add a suspension point of `latency` to every ledger operation.
    pub fn set_op_latency(&self, latency: Duration) {
        self.shared
            .faults
            .op_latency_us
            .store(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn stats(&self) -> LedgerStats {
        let c = &self.shared.counters;
        LedgerStats {
            begun: c.begun.load(Ordering::SeqCst),
            committed: c.committed.load(Ordering::SeqCst),
            aborted: c.aborted.load(Ordering::SeqCst),
        }
    }

    /// Every shipment in commit order.
    pub fn shipments(&self) -> Vec<Shipment> {
        self.shared.state.read().shipments.clone()
    }

    pub fn shipment_count(&self) -> usize {
        self.shared.state.read().shipments.len()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> LedgerResult<InMemoryTransaction> {
        self.shared.io().await?;
        self.shared.counters.begun.fetch_add(1, Ordering::SeqCst);
        trace!("ledger transaction opened");
        Ok(InMemoryTransaction {
            shared: Arc::clone(&self.shared),
            read_versions: HashMap::new(),
            staged_contracts: HashMap::new(),
            staged_shipments: Vec::new(),
            finished: false,
        })
    }

    async fn insert_contract(&self, contract: Contract) -> LedgerResult<Contract> {
        self.shared.io().await?;
        let mut state = self.shared.state.write();
        if state.contracts.contains_key(&contract.key) {
            return Err(LedgerError::ContractExists(contract.key));
        }
        state.contracts.insert(contract.key.clone(), contract.clone());
        debug!(contract_key = %contract.key, "Contract inserted");
        Ok(contract)
    }

    async fn get_contract(&self, key: &ContractKey) -> LedgerResult<Option<Contract>> {
        self.shared.io().await?;
        Ok(self.shared.state.read().contracts.get(key).cloned())
    }

    async fn list_contracts(&self, query: &ContractQuery) -> LedgerResult<Page<Contract>> {
        self.shared.io().await?;
        let matching: Vec<Contract> = self
            .shared
            .state
            .read()
            .contracts
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        Ok(query.page.apply(matching))
    }

    async fn list_shipments(&self, query: &ShipmentQuery) -> LedgerResult<Page<Shipment>> {
        self.shared.io().await?;
        // Reverse commit order.
        let matching: Vec<Shipment> = self
            .shared
            .state
            .read()
            .shipments
            .iter()
            .rev()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        Ok(query.page.apply(matching))
    }
}

/// Open transaction against an `InMemoryLedger`.
pub struct InMemoryTransaction {
    shared: Arc<Shared>,
    read_versions: HashMap<ContractKey, u64>,
    staged_contracts: HashMap<ContractKey, Contract>,
    staged_shipments: Vec<Shipment>,
    finished: bool,
}

impl InMemoryTransaction {
    /// Latest view of a contract for writing: this transaction's staged copy,
    /// otherwise the newest committed document.
    fn current(&mut self, key: &ContractKey) -> Option<Contract> {
        if let Some(staged) = self.staged_contracts.get(key) {
            return Some(staged.clone());
        }
        let committed = self.shared.state.read().contracts.get(key).cloned()?;
        self.read_versions
            .entry(key.clone())
            .or_insert(committed.version);
        Some(committed)
    }

    fn stage(&mut self, contract: Contract) {
        self.staged_contracts.insert(contract.key.clone(), contract);
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    async fn find_contract(&mut self, key: &ContractKey) -> LedgerResult<Option<Contract>> {
        self.shared.io().await?;
        Ok(self.current(key))
    }

    async fn increment_shipped_within_threshold(
        &mut self,
        key: &ContractKey,
        quantity: u64,
        actor: &ActorId,
        at: Timestamp,
    ) -> LedgerResult<Option<Contract>> {
        self.shared.io().await?;
        let Some(mut contract) = self.current(key) else {
            return Ok(None);
        };
        if !admits(&contract, quantity) {
            debug!(contract_key = %key, quantity, "Conditional increment matched no document");
            return Ok(None);
        }
        contract.batteries_shipped += quantity;
        contract.last_updated = at;
        contract.last_modified_by = actor.clone();
        self.stage(contract.clone());
        Ok(Some(contract))
    }

    async fn set_locked(
        &mut self,
        key: &ContractKey,
        locked: bool,
        actor: &ActorId,
        at: Timestamp,
        notification: Option<Notification>,
    ) -> LedgerResult<Option<Contract>> {
        self.shared.io().await?;
        let Some(mut contract) = self.current(key) else {
            return Ok(None);
        };
        contract.is_locked = locked;
        contract.last_updated = at;
        contract.last_modified_by = actor.clone();
        if let Some(notification) = notification {
            contract.notifications.push(notification);
        }
        self.stage(contract.clone());
        Ok(Some(contract))
    }

    async fn insert_shipment(&mut self, shipment: Shipment) -> LedgerResult<()> {
        self.shared.io().await?;
        if self.current(&shipment.contract_key).is_none() {
            return Err(LedgerError::ContractNotFound(shipment.contract_key));
        }
        self.staged_shipments.push(shipment);
        Ok(())
    }

    async fn commit(mut self) -> LedgerResult<()> {
        self.shared.io().await?;
        if self.shared.faults.fail_commit.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable(
                "connection lost during commit".to_string(),
            ));
        }

        let mut state = self.shared.state.write();
        for key in self.staged_contracts.keys() {
            let read = self.read_versions.get(key).copied().unwrap_or_default();
            let found = state.contracts.get(key).map(|c| c.version).unwrap_or_default();
            if read != found {
                return Err(LedgerError::WriteConflict {
                    key: key.clone(),
                    read,
                    found,
                });
            }
        }

        for (key, mut contract) in self.staged_contracts.drain() {
            contract.version += 1;
            state.contracts.insert(key, contract);
        }
        state.shipments.append(&mut self.staged_shipments);
        drop(state);

        self.finished = true;
        self.shared.counters.committed.fetch_add(1, Ordering::SeqCst);
        trace!("ledger transaction committed");
        Ok(())
    }

    async fn abort(mut self) {
        self.finished = true;
        self.shared.counters.aborted.fetch_add(1, Ordering::SeqCst);
        trace!("ledger transaction aborted");
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.counters.aborted.fetch_add(1, Ordering::SeqCst);
            trace!("ledger transaction dropped without commit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_types::{NewContract, ShipmentStatus};

    fn key(k: &str) -> ContractKey {
        ContractKey::parse(k).unwrap()
    }

    fn actor() -> ActorId {
        ActorId::new("tester")
    }

    async fn seeded(shipped: u64, threshold: u64) -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        let contract = NewContract::new(key("C1"), 10, threshold)
            .with_shipped(shipped)
            .into_contract(actor(), Utc::now());
        ledger.insert_contract(contract).await.unwrap();
        ledger
    }

    fn shipment(contract: &Contract, qty: u64) -> Shipment {
        Shipment::record(
            contract,
            qty,
            ShipmentStatus::Approved,
            actor(),
            None,
            None,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_contract_rejected() {
        let ledger = seeded(0, 10).await;
        let dup = NewContract::new(key("C1"), 1, 1).into_contract(actor(), Utc::now());
        assert_eq!(
            ledger.insert_contract(dup).await,
            Err(LedgerError::ContractExists(key("C1")))
        );
    }

    #[tokio::test]
    async fn test_commit_applies_and_bumps_version() {
        let ledger = seeded(5, 10).await;
        let mut tx = ledger.begin().await.unwrap();
        let updated = tx
            .increment_shipped_within_threshold(&key("C1"), 3, &actor(), Utc::now())
            .await
            .unwrap()
            .unwrap();
        tx.insert_shipment(shipment(&updated, 3)).await.unwrap();

        // Not visible before commit.
        assert_eq!(
            ledger.get_contract(&key("C1")).await.unwrap().unwrap().batteries_shipped,
            5
        );

        tx.commit().await.unwrap();
        let stored = ledger.get_contract(&key("C1")).await.unwrap().unwrap();
        assert_eq!(stored.batteries_shipped, 8);
        assert_eq!(stored.version, 1);
        assert_eq!(ledger.shipment_count(), 1);
        assert_eq!(ledger.stats().committed, 1);
    }

    #[tokio::test]
    async fn test_conditional_increment_no_match() {
        let ledger = seeded(55, 60).await;
        let mut tx = ledger.begin().await.unwrap();
        let result = tx
            .increment_shipped_within_threshold(&key("C1"), 10, &actor(), Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_no_trace() {
        let ledger = seeded(0, 10).await;
        {
            let mut tx = ledger.begin().await.unwrap();
            let c = tx
                .increment_shipped_within_threshold(&key("C1"), 4, &actor(), Utc::now())
                .await
                .unwrap()
                .unwrap();
            tx.insert_shipment(shipment(&c, 4)).await.unwrap();
        }
        let stored = ledger.get_contract(&key("C1")).await.unwrap().unwrap();
        assert_eq!(stored.batteries_shipped, 0);
        assert_eq!(ledger.shipment_count(), 0);
        assert_eq!(ledger.stats().aborted, 1);
    }

    #[tokio::test]
    async fn test_concurrent_writers_conflict_at_commit() {
        let ledger = seeded(0, 10).await;
        let mut a = ledger.begin().await.unwrap();
        let mut b = ledger.begin().await.unwrap();

        a.increment_shipped_within_threshold(&key("C1"), 6, &actor(), Utc::now())
            .await
            .unwrap()
            .unwrap();
        b.increment_shipped_within_threshold(&key("C1"), 6, &actor(), Utc::now())
            .await
            .unwrap()
            .unwrap();

        a.commit().await.unwrap();
        assert!(matches!(
            b.commit().await,
            Err(LedgerError::WriteConflict { read: 0, found: 1, .. })
        ));
        let stored = ledger.get_contract(&key("C1")).await.unwrap().unwrap();
        assert_eq!(stored.batteries_shipped, 6);
    }

    #[tokio::test]
    async fn test_write_time_predicate_sees_newer_commit() {
        let ledger = seeded(0, 10).await;
        let mut slow = ledger.begin().await.unwrap();
        slow.find_contract(&key("C1")).await.unwrap().unwrap();

        let mut fast = ledger.begin().await.unwrap();
        fast.increment_shipped_within_threshold(&key("C1"), 8, &actor(), Utc::now())
            .await
            .unwrap()
            .unwrap();
        fast.commit().await.unwrap();

        // The slow reader saw 0, but the write-time check sees 8.
        let result = slow
            .increment_shipped_within_threshold(&key("C1"), 5, &actor(), Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_set_locked_appends_notification() {
        let ledger = seeded(0, 10).await;
        let mut tx = ledger.begin().await.unwrap();
        let note = Notification {
            recipient: actor(),
            message: "locked".into(),
            category: shared_types::NotificationCategory::ContractLocked,
            timestamp: Utc::now(),
        };
        let c = tx
            .set_locked(&key("C1"), true, &actor(), Utc::now(), Some(note))
            .await
            .unwrap()
            .unwrap();
        assert!(c.is_locked);
        tx.commit().await.unwrap();
        let stored = ledger.get_contract(&key("C1")).await.unwrap().unwrap();
        assert!(stored.is_locked);
        assert_eq!(stored.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_shipment_for_unknown_contract_rejected() {
        let ledger = seeded(0, 10).await;
        let other = NewContract::new(key("C2"), 1, 1).into_contract(actor(), Utc::now());
        let mut tx = ledger.begin().await.unwrap();
        assert_eq!(
            tx.insert_shipment(shipment(&other, 1)).await,
            Err(LedgerError::ContractNotFound(key("C2")))
        );
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let ledger = seeded(0, 10).await;
        ledger.set_fail_commit(true);
        let mut tx = ledger.begin().await.unwrap();
        tx.increment_shipped_within_threshold(&key("C1"), 2, &actor(), Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert!(tx.commit().await.unwrap_err().is_unavailable());
        ledger.set_fail_commit(false);
        let stored = ledger.get_contract(&key("C1")).await.unwrap().unwrap();
        assert_eq!(stored.batteries_shipped, 0);
    }

    #[tokio::test]
    async fn test_unavailable_blocks_begin() {
        let ledger = seeded(0, 10).await;
        ledger.set_available(false);
        assert!(ledger.begin().await.is_err());
        assert_eq!(ledger.stats().begun, 0);
    }

    #[tokio::test]
    async fn test_list_shipments_newest_first_and_filtered() {
        let ledger = seeded(0, 100).await;
        for qty in 1..=3 {
            let mut tx = ledger.begin().await.unwrap();
            let c = tx
                .increment_shipped_within_threshold(&key("C1"), qty, &actor(), Utc::now())
                .await
                .unwrap()
                .unwrap();
            tx.insert_shipment(shipment(&c, qty)).await.unwrap();
            tx.commit().await.unwrap();
        }
        let page = ledger
            .list_shipments(&ShipmentQuery::for_contract(key("C1")))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].quantity, 3);

        let none = ledger
            .list_shipments(&ShipmentQuery::for_contract(key("C9")))
            .await
            .unwrap();
        assert_eq!(none.total, 0);
    }

    #[tokio::test]
    async fn test_list_contracts_by_locked_flag() {
        let ledger = seeded(0, 10).await;
        let locked = NewContract::new(key("C2"), 1, 5)
            .locked()
            .into_contract(actor(), Utc::now());
        ledger.insert_contract(locked).await.unwrap();

        let query = ContractQuery {
            locked: Some(true),
            ..ContractQuery::default()
        };
        let page = ledger.list_contracts(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].key, key("C2"));
    }
}
