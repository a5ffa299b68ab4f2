//! # Battery Quota Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Stack fixture, lock-bypass client, retry helper
//! └── integration/      # Cross-crate scenarios
//!     ├── concurrency.rs
//!     ├── broadcast_flow.rs
//!     └── failure_modes.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bq-tests
//! cargo test -p bq-tests integration::concurrency::
//! cargo bench -p bq-tests
//! ```

pub mod integration;
pub mod support;
