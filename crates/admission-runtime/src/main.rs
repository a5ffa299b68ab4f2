//! # Battery Quota Admission Runtime
//!
//! Runs the admission engine in-process against in-memory lock and ledger
//! backends, with a global-room observer logging every broadcast.

use anyhow::{Context, Result};
use bq_03_admission_engine::ShipmentAdmissionApi;
use shared_bus::{rooms_label, EventFilter};
use tracing::info;

use admission_runtime::{run_burst, seed_contract, AdmissionRuntime, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = RuntimeConfig::from_env().context("Failed to load runtime configuration")?;

    // Initialize logging and metrics
    let _telemetry = quota_telemetry::init_telemetry(config.telemetry.clone())
        .context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Battery Quota Admission Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let runtime = AdmissionRuntime::start(&config);

    // Observe alerts the way an admin dashboard would
    let mut alerts = runtime.bus().subscribe(EventFilter::global());
    let observer = tokio::spawn(async move {
        while let Some(delivery) = alerts.recv().await {
            info!(
                rooms = %rooms_label(&delivery.rooms),
                sequence = delivery.sequence,
                payload = %delivery.event.to_json(),
                "Broadcast received"
            );
        }
    });

    let contract = seed_contract(runtime.engine(), &config.demo)
        .await
        .context("Failed to seed demo contract")?;
    info!(
        contract_key = %contract.key,
        threshold = contract.threshold,
        requests = config.demo.requests,
        "Demo contract seeded; starting burst"
    );

    tokio::select! {
        summary = run_burst(runtime.engine(), &config.demo) => {
            let contract = runtime
                .engine()
                .contract(contract.key.as_str())
                .await
                .context("Failed to read demo contract")?;
            info!(
                batteries_shipped = contract.batteries_shipped,
                threshold = contract.threshold,
                status = %contract.status(),
                approved = summary.approved,
                blocked = summary.blocked,
                "Burst complete"
            );
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Ctrl+C received");
        }
    }

    runtime.shutdown().await;
    observer.abort();
    Ok(())
}
