//! # Event Broadcaster
//!
//! **Component:** Event Broadcaster (bq-04)
//!
//! Drains the admission engine's outcome channel and publishes each outcome
//! to the rooms that care about it.
//!
//! ## Routing
//!
//! | Outcome | Event | Rooms |
//! |---------|-------|-------|
//! | any admission | `shipment:created` | `contract:{key}` |
//! | BLOCKED admission | `contract:threshold_exceeded` | `global` + alert roles |
//! | manual lock/unlock | `contract:lock_changed` | `contract:{key}` + alert roles |
//!
//! Each event is published once with its full room list, so a subscriber in
//! several of those rooms receives it once.
//!
//! Runs as its own task and stops once every engine handle is dropped.
//! Publishing never feeds back into the engine.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod routing;
pub mod service;

pub use config::BroadcastConfig;
pub use routing::route;
pub use service::EventBroadcaster;
