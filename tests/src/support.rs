//! Shared fixtures for the integration suite and benchmarks.

use async_trait::async_trait;
use bq_01_lock_client::{
    Acquisition, DistributedLockClient, Extension, InMemoryLockBackend, LockClient, LockConfig,
    LockResult, LockToken,
};
use bq_02_ledger_store::InMemoryLedger;
use bq_03_admission_engine::{
    outcome_channel, AdmissionConfig, AdmissionEngine, AdmissionResult, CreateShipment,
    EngineResult, MockNotificationDispatcher, ShipmentAdmissionApi,
};
use bq_04_event_broadcaster::{BroadcastConfig, EventBroadcaster};
use shared_bus::InMemoryEventBus;
use shared_types::{ActorId, Contract, ContractKey, NewContract};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub type Engine<L> = AdmissionEngine<L, InMemoryLedger, MockNotificationDispatcher>;

/// Engine, backends and room bus wired together like the runtime does.
pub struct Stack<L: LockClient + 'static> {
    pub engine: Engine<L>,
    pub ledger: InMemoryLedger,
    pub locks: Arc<L>,
    pub dispatcher: Arc<MockNotificationDispatcher>,
    pub bus: Arc<InMemoryEventBus>,
    pub broadcaster: JoinHandle<u64>,
}

impl Stack<DistributedLockClient<InMemoryLockBackend>> {
    pub fn new() -> Self {
        Self::with_config(AdmissionConfig::default())
    }

    pub fn with_config(config: AdmissionConfig) -> Self {
        let locks = Arc::new(DistributedLockClient::new(
            InMemoryLockBackend::new(),
            LockConfig::default(),
        ));
        Self::with_locks(locks, config)
    }
}

impl<L: LockClient + 'static> Stack<L> {
    pub fn with_locks(locks: Arc<L>, config: AdmissionConfig) -> Self {
        let ledger = InMemoryLedger::new();
        let dispatcher = Arc::new(MockNotificationDispatcher::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let (outbound, outcomes) = outcome_channel(&config);
        let engine = AdmissionEngine::new(
            Arc::clone(&locks),
            Arc::new(ledger.clone()),
            Arc::clone(&dispatcher),
            outbound,
            config,
        );
        let broadcaster =
            EventBroadcaster::new(Arc::clone(&bus), BroadcastConfig::default()).spawn(outcomes);
        Self {
            engine,
            ledger,
            locks,
            dispatcher,
            bus,
            broadcaster,
        }
    }

    pub async fn seed(&self, key: &str, shipped: u64, threshold: u64) -> Contract {
        self.engine
            .create_contract(
                NewContract::new(contract_key(key), 10, threshold).with_shipped(shipped),
                ActorId::new("owner"),
            )
            .await
            .expect("seed contract")
    }

    pub async fn contract(&self, key: &str) -> Contract {
        self.engine.contract(key).await.expect("contract exists")
    }
}

pub fn contract_key(key: &str) -> ContractKey {
    ContractKey::parse(key).expect("valid contract key")
}

/// Submit until the outcome is not retryable or `max_attempts` is reached.
pub async fn admit_with_retry<A>(
    api: &A,
    command: CreateShipment,
    max_attempts: usize,
) -> EngineResult<AdmissionResult>
where
    A: ShipmentAdmissionApi + ?Sized,
{
    let mut attempt = 1;
    loop {
        match api.admit_shipment(command.clone()).await {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            result => return result,
        }
    }
}

/// A lock client that grants every request, as if the lock service had
/// lost its state. Leaves the ledger's own guards as the only protection.
#[derive(Debug, Default)]
pub struct LockBypassClient;

#[async_trait]
impl LockClient for LockBypassClient {
    async fn acquire(&self, _key: &ContractKey, _ttl: Duration) -> LockResult<Acquisition> {
        Ok(Acquisition::Acquired(LockToken::generate()))
    }

    async fn release(&self, _key: &ContractKey, _token: &LockToken) -> LockResult<()> {
        Ok(())
    }

    async fn extend(
        &self,
        _key: &ContractKey,
        _token: &LockToken,
        _ttl: Duration,
    ) -> LockResult<Extension> {
        Ok(Extension::Extended)
    }
}
