//! Circuit breaker state machine implementation.

use std::time::Instant;

use crate::config::BreakerConfig;

/// Represents the possible states of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Circuit is closed and operations are allowed.
    Closed,

    /// Circuit is open and operations are rejected.
    Open,

    /// Circuit is allowing a limited number of operations to test recovery.
    HalfOpen,
}

impl State {
    /// Stable lowercase label, used for metric sinks.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Open => "open",
            State::HalfOpen => "half-open",
        }
    }
}

/// A state change produced while the lock was held, reported to hooks and
/// metric sinks after the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) from: State,
    pub(crate) to: State,
}

/// Outcome of the admission check at the start of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admit {
    /// The call may proceed; carries any transition the check performed.
    Allowed(Option<Transition>),

    /// The circuit is open and the cooldown has not elapsed.
    Rejected,
}

/// The mutable record guarded by the breaker's lock.
///
/// Every read and write of these fields happens inside a single exclusive
/// critical section per call, so callers never observe a torn state. The
/// methods below are the only way the record changes; each is O(1) and
/// performs no blocking of its own.
#[derive(Debug)]
pub(crate) struct CoreState {
    state: State,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
}

impl CoreState {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
        }
    }

    pub(crate) fn state(&self) -> State {
        self.state
    }

    pub(crate) fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub(crate) fn success_count(&self) -> u32 {
        self.success_count
    }

    /// Decides whether a call may proceed, transitioning Open to HalfOpen
    /// once the cooldown has elapsed.
    ///
    /// Counter resets follow the counting epochs: entering HalfOpen resets
    /// `success_count`, entering Closed resets both counters, entering Open
    /// resets nothing. A failure streak therefore survives the Open and
    /// HalfOpen states until a success breaks it.
    pub(crate) fn admit(&mut self, config: &BreakerConfig, now: Instant) -> Admit {
        match self.state {
            State::Closed => Admit::Allowed(None),
            State::Open => {
                let cooled_down = self
                    .last_failure_time
                    .map(|t| now.duration_since(t) >= config.reset_timeout)
                    .unwrap_or(true);

                if cooled_down {
                    Admit::Allowed(Some(self.transition_to(State::HalfOpen)))
                } else {
                    Admit::Rejected
                }
            }
            State::HalfOpen => {
                // A stale half-open record that already collected enough
                // successes closes before admitting the next call.
                if self.success_count >= config.half_open_max_calls {
                    Admit::Allowed(Some(self.transition_to(State::Closed)))
                } else {
                    Admit::Allowed(None)
                }
            }
        }
    }

    /// Records a failed call, tripping the circuit at the failure threshold.
    ///
    /// Failures in HalfOpen count against the same streak: the circuit
    /// reopens once `failure_count` reaches `max_failures`, not
    /// unconditionally on the first probe failure. With no intervening
    /// success the carried-over count is already at the threshold, so a
    /// probe failure reopens immediately.
    pub(crate) fn record_failure(
        &mut self,
        config: &BreakerConfig,
        now: Instant,
    ) -> Option<Transition> {
        self.failure_count += 1;
        self.last_failure_time = Some(now);

        if self.state != State::Open && self.failure_count >= config.max_failures {
            return Some(self.transition_to(State::Open));
        }

        None
    }

    /// Records a successful call, closing the circuit once enough HalfOpen
    /// probes have succeeded.
    pub(crate) fn record_success(&mut self, config: &BreakerConfig) -> Option<Transition> {
        self.failure_count = 0;

        if self.state == State::HalfOpen {
            self.success_count += 1;
            if self.success_count >= config.half_open_max_calls {
                return Some(self.transition_to(State::Closed));
            }
        }

        None
    }

    /// Forces the circuit open, stamping the failure time so the normal
    /// cooldown applies before recovery probing.
    pub(crate) fn force_open(&mut self, now: Instant) -> Option<Transition> {
        if self.state == State::Open {
            return None;
        }

        self.last_failure_time = Some(now);
        Some(self.transition_to(State::Open))
    }

    /// Forces the circuit closed, clearing both counters.
    pub(crate) fn force_closed(&mut self) -> Option<Transition> {
        if self.state == State::Closed {
            return None;
        }

        Some(self.transition_to(State::Closed))
    }

    fn transition_to(&mut self, to: State) -> Transition {
        let from = self.state;
        self.state = to;

        match to {
            State::Closed => {
                self.failure_count = 0;
                self.success_count = 0;
            }
            State::HalfOpen => {
                self.success_count = 0;
            }
            State::Open => {}
        }

        Transition { from, to }
    }
}
