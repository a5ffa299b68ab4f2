//! # Shared Bus - Room-Partitioned Event Bus
//!
//! Carries admission outcomes from the broadcaster to every connected
//! observer.
//!
//! ## Rooms
//!
//! ```text
//!                        ┌──────────────┐
//!  publish(rooms, ev) ──→│  Event Bus   │──→ contract:{key}  subscribers
//!                        │              │──→ role:{role}     subscribers
//!                        └──────────────┘──→ global          subscribers
//! ```
//!
//! ## Delivery
//!
//! - **At-most-once** per connected subscriber; slow subscribers lose the
//!   oldest events once they fall `capacity` behind. An event addressed to
//!   several rooms is sent once, so a subscriber in more than one of them
//!   still receives it once.
//! - **Per-publisher order** only: each bus stamps a monotonically
//!   increasing `sequence`.
//! - **Never blocks** the publisher.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{rooms_label, EventFilter, Room, RoomEvent, ShipmentEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
