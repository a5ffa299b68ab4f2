//! Notification dispatcher adapters.

pub mod dispatchers;

pub use dispatchers::{MockNotificationDispatcher, TracingNotificationDispatcher};
