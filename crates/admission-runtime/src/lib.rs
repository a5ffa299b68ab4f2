//! # Admission Runtime
//!
//! Wires the admission components into one process.
//!
//! ## Modular Structure
//!
//! - `config` - `RuntimeConfig` loaded from `BQ_*` environment variables
//! - `container` - builds components, owns the broadcaster task
//! - `demo` - seeds a contract and drives a concurrent command burst
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from env)
//! 2. Initialize telemetry (logs, metrics)
//! 3. Build lock client, ledger, engine; spawn the broadcaster
//! 4. Seed the demo contract and run the burst
//! 5. Shut down on Ctrl+C or when the burst completes

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod container;
pub mod demo;

pub use config::{ConfigError, DemoConfig, RuntimeConfig};
pub use container::{AdmissionRuntime, RuntimeEngine};
pub use demo::{run_burst, seed_contract, BurstSummary};
