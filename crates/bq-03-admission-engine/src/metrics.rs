//! # Admission Metrics
//!
//! Records into the `quota-telemetry` registry when the `metrics` feature is
//! enabled; every function is a no-op otherwise.
//!
//! ```toml
//! bq-03-admission-engine = { path = "...", features = ["metrics"] }
//! ```

#[cfg(feature = "metrics")]
use quota_telemetry::{
    metric_inc, time_histogram, ADMISSIONS, ADMISSION_DURATION, LOCK_CONTENTION,
    NOTIFICATION_FAILURES, UPDATE_CONFLICTS,
};

#[cfg(feature = "metrics")]
use crate::domain::ErrorCode;
use crate::domain::{AdmissionResult, EngineResult};

/// Outcome label: `approved`, `blocked`, or the lowercase error code.
pub fn outcome_label(result: &EngineResult<AdmissionResult>) -> String {
    match result {
        Ok(admission) => admission.status.as_str().to_lowercase(),
        Err(err) => err.code().as_str().to_lowercase(),
    }
}

/// Observes admission latency into the histogram when dropped.
#[cfg(feature = "metrics")]
pub type AdmissionTimer = quota_telemetry::HistogramTimer;

/// Start timing one admission.
#[cfg(feature = "metrics")]
pub fn admission_timer() -> AdmissionTimer {
    time_histogram!(ADMISSION_DURATION)
}

/// Record one finished admission by outcome.
#[cfg(feature = "metrics")]
pub fn record_admission(result: &EngineResult<AdmissionResult>) {
    metric_inc!(ADMISSIONS, &[outcome_label(result).as_str()]);
    match result {
        Err(err) if err.code() == ErrorCode::ConcurrentOperation => metric_inc!(LOCK_CONTENTION),
        Err(err) if err.code() == ErrorCode::AtomicUpdateConflict => {
            metric_inc!(UPDATE_CONFLICTS)
        }
        _ => {}
    }
}

/// Record a failed threshold alert delivery.
#[cfg(feature = "metrics")]
pub fn record_notification_failure() {
    metric_inc!(NOTIFICATION_FAILURES);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub struct AdmissionTimer;

#[cfg(not(feature = "metrics"))]
pub fn admission_timer() -> AdmissionTimer {
    AdmissionTimer
}

#[cfg(not(feature = "metrics"))]
pub fn record_admission(_result: &EngineResult<AdmissionResult>) {}

#[cfg(not(feature = "metrics"))]
pub fn record_notification_failure() {}
