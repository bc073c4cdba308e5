//! Metric sinks for circuit breaker events.

use std::time::Duration;

/// Trait for metrics sinks that can receive circuit breaker events.
///
/// Sinks observe the three call outcomes the breaker distinguishes:
/// succeeded, failed, and rejected (circuit open, operation not attempted),
/// plus state transitions. Sink methods are invoked after the breaker's
/// lock is released and must not call back into the breaker.
pub trait MetricSink: Send + Sync + 'static {
    /// Records a state transition event.
    fn record_state_transition(&self, from: &str, to: &str);

    /// Records a completed call and its outcome.
    fn record_call(&self, success: bool, duration: Duration);

    /// Records a call rejected because the circuit was open.
    fn record_rejection(&self);
}

/// A null metrics sink that discards all events.
pub struct NullMetricSink;

impl MetricSink for NullMetricSink {
    fn record_state_transition(&self, _from: &str, _to: &str) {}
    fn record_call(&self, _success: bool, _duration: Duration) {}
    fn record_rejection(&self) {}
}

/// A sink that emits breaker events as `tracing` events.
///
/// Transitions are logged at `info` level, individual call outcomes and
/// rejections at `debug`.
#[cfg(feature = "tracing")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracing")))]
pub struct TracingMetricSink;

#[cfg(feature = "tracing")]
impl MetricSink for TracingMetricSink {
    fn record_state_transition(&self, from: &str, to: &str) {
        tracing::info!(from, to, "circuit breaker state changed");
    }

    fn record_call(&self, success: bool, duration: Duration) {
        tracing::debug!(
            success,
            duration_us = duration.as_micros() as u64,
            "circuit breaker call completed"
        );
    }

    fn record_rejection(&self) {
        tracing::debug!("circuit breaker rejected call, circuit open");
    }
}
