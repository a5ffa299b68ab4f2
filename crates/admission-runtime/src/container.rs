//! # Component Container
//!
//! Builds every admission component and owns the broadcaster task.
//!
//! ## Wiring
//!
//! ```text
//! AdmissionEngine ──mpsc<OutcomeEvent>──→ EventBroadcaster ──→ InMemoryEventBus
//!     │        │                                                    │
//!  LockClient  LedgerStore                                  room subscribers
//! ```

use bq_01_lock_client::{DistributedLockClient, InMemoryLockBackend};
use bq_02_ledger_store::InMemoryLedger;
use bq_03_admission_engine::{outcome_channel, AdmissionEngine, TracingNotificationDispatcher};
use bq_04_event_broadcaster::EventBroadcaster;
use shared_bus::InMemoryEventBus;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::RuntimeConfig;

pub type RuntimeLockClient = DistributedLockClient<InMemoryLockBackend>;

pub type RuntimeEngine =
    AdmissionEngine<RuntimeLockClient, InMemoryLedger, TracingNotificationDispatcher>;

/// All running admission components.
pub struct AdmissionRuntime {
    engine: RuntimeEngine,
    ledger: InMemoryLedger,
    bus: Arc<InMemoryEventBus>,
    broadcaster: JoinHandle<u64>,
    metrics_enabled: bool,
}

impl AdmissionRuntime {
    /// Build the components and start the broadcaster. Must be called from
    /// within a Tokio runtime.
    pub fn start(config: &RuntimeConfig) -> Self {
        let locks = Arc::new(DistributedLockClient::new(
            InMemoryLockBackend::new(),
            config.lock.clone(),
        ));
        let ledger = InMemoryLedger::new();
        let bus = Arc::new(InMemoryEventBus::with_capacity(
            config.broadcast.bus_capacity,
        ));

        let (outbound, outcomes) = outcome_channel(&config.admission);
        let engine = AdmissionEngine::new(
            locks,
            Arc::new(ledger.clone()),
            Arc::new(TracingNotificationDispatcher),
            outbound,
            config.admission.clone(),
        );
        let broadcaster =
            EventBroadcaster::new(Arc::clone(&bus), config.broadcast.clone()).spawn(outcomes);

        info!(
            lock_ttl_ms = config.admission.lock_ttl.as_millis() as u64,
            key_prefix = %config.lock.key_prefix,
            event_capacity = config.admission.event_capacity,
            "Admission runtime started"
        );

        Self {
            engine,
            ledger,
            bus,
            broadcaster,
            metrics_enabled: config.telemetry.metrics_enabled,
        }
    }

    pub fn engine(&self) -> &RuntimeEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// Prometheus text exposition of every registered metric, or `None` when
    /// metrics are disabled.
    pub fn metrics_snapshot(&self) -> Option<String> {
        if !self.metrics_enabled {
            return None;
        }
        match quota_telemetry::encode_metrics() {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to encode metrics");
                None
            }
        }
    }

    /// Drop the engine, let the broadcaster drain, and wait for it.
    ///
    /// Engine clones handed out earlier keep the broadcaster alive until
    /// they are dropped too.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        if let Some(metrics) = self.metrics_snapshot() {
            info!(metrics = %metrics, "Final metrics snapshot");
        }
        let Self {
            engine,
            broadcaster,
            ledger,
            ..
        } = self;
        drop(engine);

        match broadcaster.await {
            Ok(processed) => info!(processed, "Broadcaster drained"),
            Err(e) => warn!(error = %e, "Broadcaster task failed"),
        }

        let stats = ledger.stats();
        info!(
            begun = stats.begun,
            committed = stats.committed,
            aborted = stats.aborted,
            "Shutdown complete"
        );
    }
}
