//! Cross-crate integration scenarios.

pub mod broadcast_flow;
pub mod concurrency;
pub mod failure_modes;
