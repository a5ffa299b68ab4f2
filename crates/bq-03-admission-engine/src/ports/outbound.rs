//! Outbound (Driven) port: out-of-band alerting.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ThresholdAlert;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivers threshold alerts (email, chat, pager).
///
/// Called after the BLOCKED outcome has committed. Failures are logged by
/// the engine and never roll anything back.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, alert: ThresholdAlert) -> Result<(), DispatchError>;
}
