//! # Admission Engine Service
//!
//! One admission is one critical section:
//!
//! ```text
//! acquire lock ──Held──→ CONCURRENT_OPERATION
//!     │
//! begin tx → load → locked? → over threshold? ──yes──→ lock contract + notify log
//!     │                                 │
//!     │                                 no → conditional increment
//!     ▼                                 ▼
//! insert shipment → lease check → commit → release → emit events
//! ```
//!
//! The lock serializes work per contract; the conditional increment and the
//! commit-time version check catch a holder whose TTL expired mid-flight.

use async_trait::async_trait;
use bq_01_lock_client::{Extension, LockClient, LockGuard};
use bq_02_ledger_store::{LedgerStore, LedgerTransaction};
use chrono::Utc;
use shared_types::{
    ActorId, Contract, ContractKey, ContractQuery, NewContract, Notification,
    NotificationCategory, Page, Shipment, ShipmentQuery, ShipmentStatus, ValidationError,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::domain::{
    block_reason, AdmissionConfig, AdmissionError, AdmissionResult, EngineResult, OutcomeEvent,
    ThresholdAlert,
};
use crate::metrics;
use crate::ports::{CreateShipment, NotificationDispatcher, ShipmentAdmissionApi};

/// Create the bounded channel carrying outcome events to the broadcaster.
pub fn outcome_channel(
    config: &AdmissionConfig,
) -> (mpsc::Sender<OutcomeEvent>, mpsc::Receiver<OutcomeEvent>) {
    mpsc::channel(config.event_capacity.max(1))
}

/// Shipment admission controller.
///
/// Cheap to clone; every clone shares the same collaborators.
pub struct AdmissionEngine<L, S, N>
where
    L: LockClient + 'static,
    S: LedgerStore,
    N: NotificationDispatcher + 'static,
{
    locks: Arc<L>,
    ledger: Arc<S>,
    dispatcher: Arc<N>,
    outbound: mpsc::Sender<OutcomeEvent>,
    config: AdmissionConfig,
}

impl<L, S, N> Clone for AdmissionEngine<L, S, N>
where
    L: LockClient + 'static,
    S: LedgerStore,
    N: NotificationDispatcher + 'static,
{
    fn clone(&self) -> Self {
        Self {
            locks: Arc::clone(&self.locks),
            ledger: Arc::clone(&self.ledger),
            dispatcher: Arc::clone(&self.dispatcher),
            outbound: self.outbound.clone(),
            config: self.config.clone(),
        }
    }
}

impl<L, S, N> AdmissionEngine<L, S, N>
where
    L: LockClient + 'static,
    S: LedgerStore,
    N: NotificationDispatcher + 'static,
{
    pub fn new(
        locks: Arc<L>,
        ledger: Arc<S>,
        dispatcher: Arc<N>,
        outbound: mpsc::Sender<OutcomeEvent>,
        config: AdmissionConfig,
    ) -> Self {
        Self {
            locks,
            ledger,
            dispatcher,
            outbound,
            config,
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<S> {
        &self.ledger
    }

    pub fn locks(&self) -> &Arc<L> {
        &self.locks
    }

    // =========================================================================
    // ADMISSION
    // =========================================================================

    async fn run_admission(
        &self,
        key: ContractKey,
        quantity: u64,
        initiator: ActorId,
        note: Option<String>,
    ) -> EngineResult<AdmissionResult> {
        let Some(mut guard) =
            LockGuard::acquire(Arc::clone(&self.locks), &key, self.config.lock_ttl).await?
        else {
            debug!(contract_key = %key, quantity, "Contract lock held; rejecting");
            return Err(AdmissionError::ConcurrentOperation(key));
        };

        let outcome = self
            .admit_locked(&mut guard, &key, quantity, &initiator, note)
            .await;

        if let Err(e) = guard.release().await {
            warn!(contract_key = %key, error = %e, "Lock release failed; TTL will reclaim it");
        }

        let result = outcome?;
        info!(
            contract_key = %key,
            quantity,
            status = %result.status,
            batteries_shipped = result.contract.batteries_shipped,
            threshold = result.contract.threshold,
            "Shipment admitted"
        );

        self.emit(OutcomeEvent::Admission(result.clone()));
        if result.status == ShipmentStatus::Blocked {
            self.dispatch_alert(ThresholdAlert::for_blocked(
                &result.contract,
                quantity,
                initiator,
            ));
        }
        Ok(result)
    }

    /// Everything between lock acquisition and release. The transaction
    /// aborts on every early return when it is dropped.
    async fn admit_locked(
        &self,
        guard: &mut LockGuard<L>,
        key: &ContractKey,
        quantity: u64,
        initiator: &ActorId,
        note: Option<String>,
    ) -> EngineResult<AdmissionResult> {
        let mut tx = self.ledger.begin().await?;

        let contract = tx
            .find_contract(key)
            .await?
            .ok_or_else(|| AdmissionError::ContractNotFound(key.clone()))?;

        if contract.is_locked {
            return Err(AdmissionError::ContractLocked(key.clone()));
        }

        let now = Utc::now();
        let within_threshold = contract
            .batteries_shipped
            .checked_add(quantity)
            .is_some_and(|projected| projected <= contract.threshold);

        let (status, contract, reason) = if within_threshold {
            let updated = tx
                .increment_shipped_within_threshold(key, quantity, initiator, now)
                .await?
                .ok_or_else(|| {
                    warn!(
                        contract_key = %key,
                        quantity,
                        "Conditional increment matched nothing under lock; lock backend may have lost the lease"
                    );
                    AdmissionError::AtomicUpdateConflict {
                        key: key.clone(),
                        detail: "contract changed between read and write".into(),
                    }
                })?;
            (ShipmentStatus::Approved, updated, None)
        } else {
            let reason = block_reason(&contract, quantity);
            let notification = Notification {
                recipient: contract.created_by.clone(),
                message: reason.clone(),
                category: NotificationCategory::ThresholdExceeded,
                timestamp: now,
            };
            let updated = tx
                .set_locked(key, true, initiator, now, Some(notification))
                .await?
                .ok_or_else(|| AdmissionError::ContractNotFound(key.clone()))?;
            (ShipmentStatus::Blocked, updated, Some(reason))
        };

        let shipment = Shipment::record(
            &contract,
            quantity,
            status,
            initiator.clone(),
            reason.clone(),
            note,
            now,
        );
        tx.insert_shipment(shipment.clone()).await?;

        self.ensure_lease(guard).await?;
        tx.commit().await.map_err(|e| {
            let err = AdmissionError::from(e);
            if err.is_retryable() {
                warn!(contract_key = %key, error = %err, "Commit-time conflict");
            }
            err
        })?;

        Ok(AdmissionResult {
            status,
            shipment,
            contract,
            reason,
        })
    }

    /// Extend the lock when more than the configured share of its TTL has
    /// passed. A lost lease fails the admission before commit.
    async fn ensure_lease(&self, guard: &mut LockGuard<L>) -> EngineResult<()> {
        if guard.lease_age() <= self.config.lease_check_after() {
            return Ok(());
        }
        match guard.extend().await? {
            Extension::Extended => {
                debug!(contract_key = %guard.key(), "Lock lease extended before commit");
                Ok(())
            }
            Extension::Expired => {
                warn!(contract_key = %guard.key(), "Lock lease expired before commit");
                Err(AdmissionError::AtomicUpdateConflict {
                    key: guard.key().clone(),
                    detail: "lock lease expired before commit".into(),
                })
            }
        }
    }

    // =========================================================================
    // MANUAL LOCK
    // =========================================================================

    async fn run_set_lock(
        &self,
        key: ContractKey,
        locked: bool,
        actor: ActorId,
        reason: Option<String>,
    ) -> EngineResult<Contract> {
        let Some(guard) =
            LockGuard::acquire(Arc::clone(&self.locks), &key, self.config.lock_ttl).await?
        else {
            return Err(AdmissionError::ConcurrentOperation(key));
        };

        let outcome = self.toggle_locked(&key, locked, &actor, reason.as_deref()).await;

        if let Err(e) = guard.release().await {
            warn!(contract_key = %key, error = %e, "Lock release failed; TTL will reclaim it");
        }

        let (contract, changed) = outcome?;
        if changed {
            info!(contract_key = %key, locked, actor = %actor, "Contract lock state changed");
            self.emit(OutcomeEvent::LockChanged {
                at: contract.last_updated,
                contract: contract.clone(),
                changed_by: actor,
                reason,
            });
        } else {
            debug!(contract_key = %key, locked, "Lock state unchanged");
        }
        Ok(contract)
    }

    /// Returns the contract and whether anything was written.
    async fn toggle_locked(
        &self,
        key: &ContractKey,
        locked: bool,
        actor: &ActorId,
        reason: Option<&str>,
    ) -> EngineResult<(Contract, bool)> {
        let mut tx = self.ledger.begin().await?;
        let contract = tx
            .find_contract(key)
            .await?
            .ok_or_else(|| AdmissionError::ContractNotFound(key.clone()))?;

        if contract.is_locked == locked {
            tx.abort().await;
            return Ok((contract, false));
        }

        let now = Utc::now();
        let (category, verb) = if locked {
            (NotificationCategory::ContractLocked, "locked")
        } else {
            (NotificationCategory::ContractUnlocked, "unlocked")
        };
        let message = match reason {
            Some(reason) => format!("Contract {key} {verb} by {actor}: {reason}"),
            None => format!("Contract {key} {verb} by {actor}"),
        };
        let notification = Notification {
            recipient: contract.created_by.clone(),
            message,
            category,
            timestamp: now,
        };

        let updated = tx
            .set_locked(key, locked, actor, now, Some(notification))
            .await?
            .ok_or_else(|| AdmissionError::ContractNotFound(key.clone()))?;
        tx.commit().await?;
        Ok((updated, true))
    }

    // =========================================================================
    // SIDE EFFECTS
    // =========================================================================

    fn emit(&self, event: OutcomeEvent) {
        match self.outbound.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    contract_key = %event.contract_key(),
                    "Outbound event channel full; event dropped"
                );
            }
            Err(TrySendError::Closed(event)) => {
                debug!(
                    contract_key = %event.contract_key(),
                    "No broadcaster attached; event dropped"
                );
            }
        }
    }

    fn dispatch_alert(&self, alert: ThresholdAlert) {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let contract_key = alert.contract_key.clone();
            if let Err(e) = dispatcher.notify(alert).await {
                metrics::record_notification_failure();
                warn!(contract_key = %contract_key, error = %e, "Threshold alert not delivered");
            }
        });
    }
}

/// Run `work` on its own task so dropping the caller's future cannot
/// interrupt a critical section halfway.
async fn detached<T, F>(work: F) -> EngineResult<T>
where
    T: Send + 'static,
    F: Future<Output = EngineResult<T>> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(AdmissionError::BackendUnavailable(format!(
            "admission task aborted: {e}"
        ))),
    }
}

#[async_trait]
impl<L, S, N> ShipmentAdmissionApi for AdmissionEngine<L, S, N>
where
    L: LockClient + 'static,
    S: LedgerStore,
    N: NotificationDispatcher + 'static,
{
    async fn admit_shipment(&self, command: CreateShipment) -> EngineResult<AdmissionResult> {
        let key = ContractKey::parse(&command.contract_key)?;
        if command.quantity == 0 {
            return Err(ValidationError::ZeroQuantity.into());
        }

        let _timer = metrics::admission_timer();
        let engine = self.clone();
        let result = detached(async move {
            engine
                .run_admission(key, command.quantity, command.initiator, command.note)
                .await
        })
        .await;

        if let Err(e) = &result {
            debug!(code = %e.code(), error = %e, "Admission rejected");
        }
        metrics::record_admission(&result);
        result
    }

    async fn set_contract_lock(
        &self,
        contract_key: &str,
        locked: bool,
        actor: ActorId,
        reason: Option<String>,
    ) -> EngineResult<Contract> {
        let key = ContractKey::parse(contract_key)?;
        let engine = self.clone();
        detached(async move { engine.run_set_lock(key, locked, actor, reason).await }).await
    }

    async fn create_contract(&self, new: NewContract, actor: ActorId) -> EngineResult<Contract> {
        new.validate()?;
        let contract = new.into_contract(actor, Utc::now());
        let created = self.ledger.insert_contract(contract).await?;
        info!(
            contract_key = %created.key,
            threshold = created.threshold,
            device_count = created.device_count,
            status = %created.status(),
            "Contract created"
        );
        Ok(created)
    }

    async fn contract(&self, contract_key: &str) -> EngineResult<Contract> {
        let key = ContractKey::parse(contract_key)?;
        self.ledger
            .get_contract(&key)
            .await?
            .ok_or(AdmissionError::ContractNotFound(key))
    }

    async fn list_contracts(&self, query: ContractQuery) -> EngineResult<Page<Contract>> {
        Ok(self.ledger.list_contracts(&query).await?)
    }

    async fn list_shipments(&self, query: ShipmentQuery) -> EngineResult<Page<Shipment>> {
        Ok(self.ledger.list_shipments(&query).await?)
    }
}
