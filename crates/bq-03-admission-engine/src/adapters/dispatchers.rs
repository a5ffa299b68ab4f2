//! Dispatcher adapters: a logging one for the runtime and a recording mock.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use crate::domain::ThresholdAlert;
use crate::ports::{DispatchError, NotificationDispatcher};

/// Writes every alert to the log at WARN.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for TracingNotificationDispatcher {
    async fn notify(&self, alert: ThresholdAlert) -> Result<(), DispatchError> {
        warn!(
            contract_key = %alert.contract_key,
            attempted_quantity = alert.attempted_quantity,
            resulting_total = alert.resulting_total,
            threshold = alert.threshold,
            device_count = alert.device_count,
            initiator = %alert.initiator,
            recipient = %alert.recipient,
            "Threshold exceeded; contract locked pending review"
        );
        Ok(())
    }
}

/// Records alerts in memory. Can be switched to fail every delivery.
#[derive(Debug, Default)]
pub struct MockNotificationDispatcher {
    alerts: Mutex<Vec<ThresholdAlert>>,
    failing: AtomicBool,
}

impl MockNotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Alerts delivered so far, in call order. Failed deliveries are included.
    pub fn alerts(&self) -> Vec<ThresholdAlert> {
        self.alerts.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().len()
    }
}

#[async_trait]
impl NotificationDispatcher for MockNotificationDispatcher {
    async fn notify(&self, alert: ThresholdAlert) -> Result<(), DispatchError> {
        self.alerts.lock().push(alert);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DispatchError::Delivery("mock dispatcher failing".into()));
        }
        Ok(())
    }
}
