//! Broadcaster configuration.

use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_types::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Roles whose rooms receive threshold and lock-change alerts.
    pub alert_roles: Vec<Role>,
    /// Per-subscriber buffer of the room bus.
    pub bus_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            alert_roles: vec![Role::Admin, Role::Manager],
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
