//! Configuration for circuit breakers.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::breaker::CircuitBreaker;
use crate::hook::HookRegistry;
use crate::metrics::{MetricSink, NullMetricSink};

/// Thresholds and timings fixed at construction time.
#[derive(Debug, Clone)]
pub(crate) struct BreakerConfig {
    /// Consecutive failures that trip the circuit open.
    pub(crate) max_failures: u32,

    /// Minimum time spent open before a recovery probe is admitted.
    pub(crate) reset_timeout: Duration,

    /// Consecutive half-open successes required to close the circuit.
    pub(crate) half_open_max_calls: u32,
}

pub(crate) const DEFAULT_HALF_OPEN_MAX_CALLS: u32 = 3;

/// Builder for creating circuit breakers with custom configurations.
pub struct BreakerBuilder<E>
where
    E: std::error::Error + 'static,
{
    max_failures: u32,
    reset_timeout: Duration,
    half_open_max_calls: u32,
    metric_sink: Arc<dyn MetricSink>,
    hook_registry: Arc<HookRegistry>,
    _error_type: PhantomData<E>,
}

impl<E> Default for BreakerBuilder<E>
where
    E: std::error::Error + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> BreakerBuilder<E>
where
    E: std::error::Error + 'static,
{
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            max_failures: 5,
            reset_timeout: Duration::from_secs(30),
            half_open_max_calls: DEFAULT_HALF_OPEN_MAX_CALLS,
            metric_sink: Arc::new(NullMetricSink),
            hook_registry: Arc::new(HookRegistry::new()),
            _error_type: PhantomData,
        }
    }

    /// Sets the number of consecutive failures that trip the circuit open.
    ///
    /// Must be at least 1; `build` panics otherwise.
    pub fn max_failures(mut self, count: u32) -> Self {
        self.max_failures = count;
        self
    }

    /// Sets the cooldown before the circuit transitions from open to
    /// half-open.
    ///
    /// A zero timeout makes the circuit eligible for half-open on the very
    /// next call after tripping.
    pub fn reset_timeout(mut self, duration: Duration) -> Self {
        self.reset_timeout = duration;
        self
    }

    /// Sets the number of consecutive half-open successes required to close
    /// the circuit.
    pub fn half_open_max_calls(mut self, count: u32) -> Self {
        self.half_open_max_calls = count;
        self
    }

    /// Sets a metric sink for the circuit breaker.
    pub fn metric_sink<M: MetricSink>(mut self, sink: M) -> Self {
        self.metric_sink = Arc::new(sink);
        self
    }

    /// Sets a hook registry for the circuit breaker.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hook_registry = Arc::new(hooks);
        self
    }

    /// Builds a new circuit breaker with the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if `max_failures` or `half_open_max_calls` is zero.
    pub fn build(self) -> CircuitBreaker<E> {
        assert!(self.max_failures > 0, "max_failures must be at least 1");
        assert!(
            self.half_open_max_calls > 0,
            "half_open_max_calls must be at least 1"
        );

        let config = BreakerConfig {
            max_failures: self.max_failures,
            reset_timeout: self.reset_timeout,
            half_open_max_calls: self.half_open_max_calls,
        };

        CircuitBreaker::from_parts(config, self.metric_sink, self.hook_registry)
    }
}
