//! Core circuit breaker implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{BreakerBuilder, BreakerConfig};
use crate::error::{BreakerError, BreakerResult};
use crate::hook::HookRegistry;
use crate::metrics::MetricSink;
use crate::state::{Admit, CoreState, State, Transition};

/// Inner state of the circuit breaker, shared between clones.
struct BreakerInner {
    core: Mutex<CoreState>,
    config: BreakerConfig,
    metric_sink: Arc<dyn MetricSink>,
    hooks: Arc<HookRegistry>,
}

/// A circuit breaker that wraps function calls to prevent cascading
/// failures.
///
/// The breaker holds its lock only for the admission decision before a call
/// and the outcome recording after it. The protected operation itself runs
/// with the lock released, so one slow call never serializes other callers'
/// admission checks.
///
/// Each protected resource gets its own breaker instance; cloning shares
/// the same underlying state.
pub struct CircuitBreaker<E>
where
    E: std::error::Error + 'static,
{
    inner: Arc<BreakerInner>,
    _error_type: std::marker::PhantomData<E>,
}

impl<E> CircuitBreaker<E>
where
    E: std::error::Error + 'static,
{
    /// Creates a circuit breaker that trips after `max_failures` consecutive
    /// failures and stays open for at least `reset_timeout` before admitting
    /// a recovery probe.
    ///
    /// The half-open success threshold keeps its default of 3; use
    /// [`builder`](Self::builder) to change it or to attach hooks and a
    /// metric sink.
    ///
    /// # Panics
    ///
    /// Panics if `max_failures` is zero.
    pub fn new(max_failures: u32, reset_timeout: Duration) -> Self {
        Self::builder()
            .max_failures(max_failures)
            .reset_timeout(reset_timeout)
            .build()
    }

    /// Creates a new builder for customizing a circuit breaker.
    pub fn builder() -> BreakerBuilder<E> {
        BreakerBuilder::new()
    }

    pub(crate) fn from_parts(
        config: BreakerConfig,
        metric_sink: Arc<dyn MetricSink>,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        let inner = BreakerInner {
            core: Mutex::new(CoreState::new()),
            config,
            metric_sink,
            hooks,
        };

        Self {
            inner: Arc::new(inner),
            _error_type: std::marker::PhantomData,
        }
    }

    /// Gets the current state of the circuit breaker.
    pub fn current_state(&self) -> State {
        self.inner.core.lock().state()
    }

    /// Gets the current consecutive failure count.
    pub fn failure_count(&self) -> u32 {
        self.inner.core.lock().failure_count()
    }

    /// Gets the number of successful probes in the current half-open epoch.
    pub fn success_count(&self) -> u32 {
        self.inner.core.lock().success_count()
    }

    /// Executes a function wrapped by the circuit breaker.
    ///
    /// Returns [`BreakerError::Open`] without invoking `f` when the circuit
    /// is open and the cooldown has not elapsed. Otherwise runs `f` and
    /// returns its result, with an operation error carried unchanged in
    /// [`BreakerError::Operation`].
    pub fn call<F, T>(&self, f: F) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.pre_call()?;

        let start = Instant::now();
        let result = f();
        let duration = start.elapsed();

        self.post_call(&result, duration);

        result.map_err(BreakerError::Operation)
    }

    /// Checks if a call is allowed based on the current state.
    ///
    /// Lock scope: exactly the admission decision. Hooks and metrics fire
    /// after the lock is released.
    fn pre_call(&self) -> Result<(), BreakerError<E>> {
        let decision = self.inner.core.lock().admit(&self.inner.config, Instant::now());

        match decision {
            Admit::Allowed(transition) => {
                if let Some(t) = transition {
                    self.notify_transition(t);
                }
                Ok(())
            }
            Admit::Rejected => {
                self.inner.metric_sink.record_rejection();
                self.inner.hooks.notify_rejected();
                Err(BreakerError::Open)
            }
        }
    }

    /// Feeds the outcome of a call back into the state machine.
    ///
    /// Lock scope: exactly the bookkeeping. Hooks and metrics fire after
    /// the lock is released.
    fn post_call<T>(&self, result: &Result<T, E>, duration: Duration) {
        let success = result.is_ok();

        let transition = {
            let mut core = self.inner.core.lock();
            if success {
                core.record_success(&self.inner.config)
            } else {
                core.record_failure(&self.inner.config, Instant::now())
            }
        };

        self.inner.metric_sink.record_call(success, duration);
        if success {
            self.inner.hooks.notify_success();
        } else {
            self.inner.hooks.notify_failure();
        }

        if let Some(t) = transition {
            self.notify_transition(t);
        }
    }

    fn notify_transition(&self, transition: Transition) {
        self.inner.hooks.notify_transition(transition.to);
        self.inner
            .metric_sink
            .record_state_transition(transition.from.as_str(), transition.to.as_str());
    }

    /// Forces the circuit breaker to the open state.
    ///
    /// Returns `true` if a transition happened. The normal cooldown applies
    /// before the circuit half-opens again.
    pub fn force_open(&self) -> bool {
        let transition = self.inner.core.lock().force_open(Instant::now());

        match transition {
            Some(t) => {
                self.notify_transition(t);
                true
            }
            None => false,
        }
    }

    /// Forces the circuit breaker to the closed state, clearing the
    /// failure streak.
    ///
    /// Returns `true` if a transition happened.
    pub fn force_closed(&self) -> bool {
        let transition = self.inner.core.lock().force_closed();

        match transition {
            Some(t) => {
                self.notify_transition(t);
                true
            }
            None => false,
        }
    }
}

// Allow cloning of circuit breakers - cheap because inner state is Arc'd
impl<E> Clone for CircuitBreaker<E>
where
    E: std::error::Error + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _error_type: std::marker::PhantomData,
        }
    }
}

// Implement Async support when the feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
impl<E> CircuitBreaker<E>
where
    E: std::error::Error + 'static,
{
    /// Executes an async function wrapped by the circuit breaker.
    ///
    /// The admission and bookkeeping locks are never held across an await
    /// point; the future runs entirely outside the lock.
    pub async fn call_async<F, Fut, T>(&self, f: F) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.pre_call()?;

        let start = Instant::now();
        let result = f().await;
        let duration = start.elapsed();

        self.post_call(&result, duration);

        result.map_err(BreakerError::Operation)
    }
}
