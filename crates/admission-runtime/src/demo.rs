//! # Demo Burst
//!
//! Seeds one contract and fires concurrent shipment commands at it, retrying
//! retryable rejections with jittered backoff. The contract ends at or below
//! its threshold however the requests interleave.

use bq_03_admission_engine::{
    AdmissionError, AdmissionResult, CommandResponse, CreateShipment, ErrorCode,
    ShipmentAdmissionApi,
};
use rand::Rng;
use shared_types::{ActorId, Contract, ContractKey, NewContract, ShipmentStatus};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::config::DemoConfig;
use crate::container::RuntimeEngine;

/// Tally of a finished burst.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BurstSummary {
    pub approved: usize,
    pub blocked: usize,
    /// Commands that ended in an error after retries.
    pub rejected: HashMap<ErrorCode, usize>,
    /// Retryable rejections that were retried.
    pub retries: usize,
    pub approved_quantity: u64,
    /// Submission tasks that panicked or were cancelled.
    pub failed_tasks: usize,
}

/// Response, retry count and requested quantity of one submission.
type Submission = (CommandResponse<AdmissionResult>, usize, u64);

impl BurstSummary {
    pub fn total(&self) -> usize {
        self.approved + self.blocked + self.rejected.values().sum::<usize>() + self.failed_tasks
    }

    fn record(&mut self, joined: Result<Submission, JoinError>) {
        let (response, retries, quantity) = match joined {
            Ok(submission) => submission,
            Err(e) => {
                warn!(error = %e, panicked = e.is_panic(), "Shipment submission task failed");
                self.failed_tasks += 1;
                return;
            }
        };
        self.retries += retries;
        match (response.data, response.error) {
            (Some(result), _) if result.status == ShipmentStatus::Approved => {
                self.approved += 1;
                self.approved_quantity += quantity;
            }
            (Some(_), _) => self.blocked += 1,
            (None, Some(error)) => *self.rejected.entry(error.code).or_insert(0) += 1,
            (None, None) => {}
        }
    }
}

/// Create the demo contract.
pub async fn seed_contract(
    engine: &RuntimeEngine,
    demo: &DemoConfig,
) -> Result<Contract, AdmissionError> {
    let key = ContractKey::parse(&demo.contract_key)?;
    engine
        .create_contract(
            NewContract::new(key, demo.device_count, demo.threshold),
            ActorId::new("demo-admin"),
        )
        .await
}

/// Submit `demo.requests` commands concurrently and wait for all of them.
pub async fn run_burst(engine: &RuntimeEngine, demo: &DemoConfig) -> BurstSummary {
    let mut tasks = JoinSet::new();
    for i in 0..demo.requests {
        let engine = engine.clone();
        let quantity = rand::thread_rng().gen_range(1..=demo.max_quantity.max(1));
        let command = CreateShipment::new(
            demo.contract_key.clone(),
            quantity,
            ActorId::new(format!("operator-{}", i % 4)),
        )
        .with_note(format!("demo request {i}"));
        let max_retries = demo.max_retries;
        tasks.spawn(async move { submit_with_retry(&engine, command, max_retries).await });
    }

    let mut summary = BurstSummary::default();
    while let Some(joined) = tasks.join_next().await {
        summary.record(joined);
    }

    info!(
        approved = summary.approved,
        blocked = summary.blocked,
        rejected = summary.rejected.values().sum::<usize>(),
        retries = summary.retries,
        failed_tasks = summary.failed_tasks,
        approved_quantity = summary.approved_quantity,
        "Demo burst finished"
    );
    summary
}

async fn submit_with_retry(
    engine: &RuntimeEngine,
    command: CreateShipment,
    max_retries: u32,
) -> Submission {
    let quantity = command.quantity;
    let mut retries = 0usize;
    loop {
        match engine.admit_shipment(command.clone()).await {
            Err(e) if e.is_retryable() && retries < max_retries as usize => {
                retries += 1;
                let backoff = rand::thread_rng().gen_range(1..=10u64);
                debug!(code = %e.code(), retries, backoff_ms = backoff, "Retrying shipment");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            result => return (result.into(), retries, quantity),
        }
    }
}
