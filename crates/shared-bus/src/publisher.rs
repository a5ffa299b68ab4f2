//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{rooms_label, EventFilter, Room, RoomEvent, ShipmentEvent};
use crate::subscriber::{EventStream, Subscription, SubscriptionTicket};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event once, addressed to every room in `rooms`.
    ///
    /// # Returns
    ///
    /// The number of connected subscribers the event was handed to (before
    /// room filtering).
    async fn publish(&self, rooms: Vec<Room>, event: ShipmentEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Subscribers filter by room on receipt. Delivery is at-most-once: a
/// subscriber that falls more than `capacity` events behind loses the
/// oldest ones.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<RoomEvent>,

    /// Active subscription count by room set.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total events published, also the sequence source.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let room_key = Self::room_key(&filter);

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(room_key.clone()).or_insert(0) += 1;
        }

        debug!(rooms = %room_key, "New subscription created");

        let ticket = SubscriptionTicket::new(self.subscriptions.clone(), room_key);
        Subscription::new(receiver, filter, ticket)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Get the number of connected subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Number of live subscriptions whose filter is exactly `filter`.
    #[must_use]
    pub fn subscriptions_for(&self, filter: &EventFilter) -> usize {
        self.subscriptions
            .read()
            .ok()
            .and_then(|subs| subs.get(&Self::room_key(filter)).copied())
            .unwrap_or(0)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn room_key(filter: &EventFilter) -> String {
        if filter.rooms.is_empty() {
            return "*".to_string();
        }
        rooms_label(&filter.rooms)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, rooms: Vec<Room>, event: ShipmentEvent) -> usize {
        // Always increment counter (event was attempted)
        let sequence = self.events_published.fetch_add(1, Ordering::Relaxed) + 1;
        let name = event.name();
        let room_label = rooms_label(&rooms);

        match self.sender.send(RoomEvent {
            rooms,
            sequence,
            event,
        }) {
            Ok(receiver_count) => {
                debug!(
                    event = name,
                    rooms = %room_label,
                    sequence,
                    receivers = receiver_count,
                    "Event published"
                );
                receiver_count
            }
            Err(_) => {
                // No receivers - event is dropped
                warn!(
                    event = name,
                    rooms = %room_label,
                    sequence,
                    "Event dropped (no receivers)"
                );
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
