//! Broadcaster task.

use bq_03_admission_engine::OutcomeEvent;
use shared_bus::{rooms_label, EventPublisher};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::BroadcastConfig;
use crate::routing::route;

/// Publishes engine outcomes to the room bus.
pub struct EventBroadcaster<P: EventPublisher + ?Sized> {
    publisher: Arc<P>,
    config: BroadcastConfig,
}

impl<P: EventPublisher + ?Sized + 'static> EventBroadcaster<P> {
    pub fn new(publisher: Arc<P>, config: BroadcastConfig) -> Self {
        Self { publisher, config }
    }

    /// Publish one outcome. Returns the number of events published.
    pub async fn broadcast(&self, outcome: &OutcomeEvent) -> usize {
        let deliveries = route(outcome, &self.config);
        let count = deliveries.len();
        for (rooms, event) in deliveries {
            let name = event.name();
            let room_label = rooms_label(&rooms);
            let receivers = self.publisher.publish(rooms, event).await;
            record_broadcast(name);
            debug!(
                contract_key = %outcome.contract_key(),
                event = name,
                rooms = %room_label,
                receivers,
                "Outcome broadcast"
            );
        }
        count
    }

    /// Drain `outcomes` until every sender is dropped.
    pub async fn run(self, mut outcomes: mpsc::Receiver<OutcomeEvent>) -> u64 {
        info!(alert_roles = ?self.config.alert_roles, "Event broadcaster started");
        let mut processed = 0u64;
        while let Some(outcome) = outcomes.recv().await {
            self.broadcast(&outcome).await;
            processed += 1;
        }
        info!(processed, "Event broadcaster stopped");
        processed
    }

    /// Run on a background task. The handle resolves to the number of
    /// outcomes processed.
    pub fn spawn(self, outcomes: mpsc::Receiver<OutcomeEvent>) -> JoinHandle<u64> {
        tokio::spawn(self.run(outcomes))
    }
}

#[cfg(feature = "metrics")]
fn record_broadcast(event: &str) {
    quota_telemetry::metric_inc!(quota_telemetry::EVENTS_BROADCAST, &[event]);
}

#[cfg(not(feature = "metrics"))]
fn record_broadcast(_event: &str) {}
