//! Domain layer for the admission engine.

pub mod config;
pub mod errors;
pub mod outcome;

pub use config::AdmissionConfig;
pub use errors::{AdmissionError, EngineResult, ErrorCode};
pub use outcome::{block_reason, AdmissionResult, OutcomeEvent, ThresholdAlert};
