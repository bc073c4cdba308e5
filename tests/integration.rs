use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tripswitch::{BreakerError, CircuitBreaker, HookRegistry, MetricSink, State};

// Custom error type that implements Error trait
#[derive(Debug)]
struct TestError(String);

impl TestError {
    fn new(msg: &str) -> Self {
        TestError(msg.to_string())
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test error: {}", self.0)
    }
}

impl Error for TestError {}

fn fail() -> Result<(), TestError> {
    Err(TestError::new("boom"))
}

fn succeed() -> Result<(), TestError> {
    Ok(())
}

#[test]
fn starts_closed_and_trips_at_threshold() {
    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(3)
        .reset_timeout(Duration::from_secs(60))
        .build();

    assert_eq!(breaker.current_state(), State::Closed);

    // Two failures stay below the threshold
    assert!(breaker.call(fail).is_err());
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Closed);
    assert_eq!(breaker.failure_count(), 2);

    // Third failure trips the circuit
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);
}

#[test]
fn open_circuit_rejects_without_invoking_operation() {
    let breaker = CircuitBreaker::<TestError>::new(1, Duration::from_secs(60));

    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);

    let invoked = AtomicUsize::new(0);
    let result = breaker.call(|| {
        invoked.fetch_add(1, Ordering::SeqCst);
        succeed()
    });

    assert!(matches!(result, Err(BreakerError::Open)));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[test]
fn single_failure_opens_with_threshold_of_one() {
    let breaker = CircuitBreaker::<TestError>::new(1, Duration::from_secs(60));

    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);
}

#[test]
fn success_resets_consecutive_failure_count() {
    let breaker = CircuitBreaker::<TestError>::new(3, Duration::from_secs(60));

    assert!(breaker.call(fail).is_err());
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.failure_count(), 2);

    assert!(breaker.call(succeed).is_ok());
    assert_eq!(breaker.failure_count(), 0);
    assert_eq!(breaker.current_state(), State::Closed);

    // Failure counting is consecutive, not cumulative over the lifetime:
    // a fresh run of three failures is required to trip
    assert!(breaker.call(fail).is_err());
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Closed);
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);
}

#[test]
fn cooldown_gates_the_half_open_transition() {
    let breaker = CircuitBreaker::<TestError>::new(3, Duration::from_millis(200));

    for _ in 0..3 {
        assert!(breaker.call(fail).is_err());
    }
    assert_eq!(breaker.current_state(), State::Open);

    // Immediately after tripping the call is rejected outright
    let result = breaker.call(succeed);
    assert!(matches!(result, Err(BreakerError::Open)));

    thread::sleep(Duration::from_millis(400));

    // Past the cooldown the probe is admitted and the operation runs
    let invoked = AtomicUsize::new(0);
    let result = breaker.call(|| {
        invoked.fetch_add(1, Ordering::SeqCst);
        succeed()
    });
    assert!(result.is_ok());
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert_eq!(breaker.current_state(), State::HalfOpen);
    assert_eq!(breaker.success_count(), 1);
}

#[test]
fn half_open_closes_after_enough_consecutive_successes() {
    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(1)
        .reset_timeout(Duration::ZERO)
        .half_open_max_calls(2)
        .build();

    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);

    // Zero cooldown: the next call is admitted as a half-open probe
    assert!(breaker.call(succeed).is_ok());
    assert_eq!(breaker.current_state(), State::HalfOpen);
    assert_eq!(breaker.success_count(), 1);

    assert!(breaker.call(succeed).is_ok());
    assert_eq!(breaker.current_state(), State::Closed);
    assert_eq!(breaker.failure_count(), 0);
    assert_eq!(breaker.success_count(), 0);
}

#[test]
fn half_open_with_threshold_of_one_closes_on_first_success() {
    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(1)
        .reset_timeout(Duration::ZERO)
        .half_open_max_calls(1)
        .build();

    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);

    assert!(breaker.call(succeed).is_ok());
    assert_eq!(breaker.current_state(), State::Closed);
}

// A probe failure does not unconditionally reopen the circuit: failures
// accumulate on the same streak, and the circuit reopens only once the
// streak reaches max_failures again.
#[test]
fn half_open_failure_policy_is_cumulative() {
    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(2)
        .reset_timeout(Duration::ZERO)
        .half_open_max_calls(3)
        .build();

    assert!(breaker.call(fail).is_err());
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);

    // Probe succeeds: the failure streak is broken
    assert!(breaker.call(succeed).is_ok());
    assert_eq!(breaker.current_state(), State::HalfOpen);
    assert_eq!(breaker.failure_count(), 0);

    // One probe failure is below the threshold, the circuit stays half-open
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::HalfOpen);
    assert_eq!(breaker.failure_count(), 1);

    // The second failure completes the streak and reopens
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);
}

#[test]
fn half_open_failure_with_unbroken_streak_reopens_immediately() {
    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(2)
        .reset_timeout(Duration::ZERO)
        .build();

    assert!(breaker.call(fail).is_err());
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);

    // The streak carried into half-open is already at the threshold, so
    // one more failure reopens at once
    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);
}

#[test]
fn operation_error_is_propagated_verbatim() {
    let breaker = CircuitBreaker::<TestError>::new(5, Duration::from_secs(60));

    let result = breaker.call(|| -> Result<(), TestError> {
        Err(TestError::new("connection refused"))
    });

    match result {
        Err(BreakerError::Operation(e)) => {
            assert_eq!(e.to_string(), "test error: connection refused");
        }
        other => panic!("expected operation error, got {:?}", other),
    }
}

#[test]
fn error_display_and_source() {
    let open: BreakerError<TestError> = BreakerError::Open;
    assert_eq!(open.to_string(), "circuit breaker is open");
    assert!(open.source().is_none());

    let op: BreakerError<TestError> = BreakerError::Operation(TestError::new("boom"));
    assert_eq!(op.to_string(), "operation error: test error: boom");
    assert!(op.source().is_some());
}

#[test]
fn manual_control() {
    let breaker = CircuitBreaker::<TestError>::builder().build();

    // Force open
    assert!(breaker.force_open());
    assert_eq!(breaker.current_state(), State::Open);

    // Calls are rejected while open
    let result = breaker.call(succeed);
    assert!(matches!(result, Err(BreakerError::Open)));

    // Forcing open again is a no-op
    assert!(!breaker.force_open());

    // Force closed
    assert!(breaker.force_closed());
    assert_eq!(breaker.current_state(), State::Closed);
    assert_eq!(breaker.failure_count(), 0);

    // Forcing closed again is a no-op
    assert!(!breaker.force_closed());
}

#[test]
fn clones_share_the_same_breaker() {
    let breaker = CircuitBreaker::<TestError>::new(2, Duration::from_secs(60));
    let other = breaker.clone();

    assert!(other.call(fail).is_err());
    assert!(other.call(fail).is_err());

    assert_eq!(breaker.current_state(), State::Open);
}

#[test]
fn hooks_fire_for_transitions_and_outcomes() {
    let opened = Arc::new(AtomicUsize::new(0));
    let half_opened = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(AtomicUsize::new(0));
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));
    let rejections = Arc::new(AtomicUsize::new(0));

    let hooks = HookRegistry::new();
    {
        let opened = Arc::clone(&opened);
        hooks.set_on_open(move || {
            opened.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let half_opened = Arc::clone(&half_opened);
        hooks.set_on_half_open(move || {
            half_opened.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let closed = Arc::clone(&closed);
        hooks.set_on_close(move || {
            closed.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let successes = Arc::clone(&successes);
        hooks.set_on_success(move || {
            successes.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let failures = Arc::clone(&failures);
        hooks.set_on_failure(move || {
            failures.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let rejections = Arc::clone(&rejections);
        hooks.set_on_rejected(move || {
            rejections.fetch_add(1, Ordering::SeqCst);
        });
    }

    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(1)
        .reset_timeout(Duration::from_secs(60))
        .half_open_max_calls(1)
        .hooks(hooks)
        .build();

    assert!(breaker.call(fail).is_err()); // trips open
    assert!(breaker.call(succeed).is_err()); // rejected
    assert!(breaker.force_closed());
    assert!(breaker.call(succeed).is_ok());

    assert_eq!(opened.load(Ordering::SeqCst), 1);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert_eq!(half_opened.load(Ordering::SeqCst), 0);
    assert_eq!(successes.load(Ordering::SeqCst), 1);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(rejections.load(Ordering::SeqCst), 1);
}

struct RecordingSink {
    events: Arc<Mutex<Vec<String>>>,
}

impl MetricSink for RecordingSink {
    fn record_state_transition(&self, from: &str, to: &str) {
        self.events.lock().push(format!("{} -> {}", from, to));
    }

    fn record_call(&self, success: bool, _duration: Duration) {
        self.events
            .lock()
            .push(if success { "ok" } else { "err" }.to_string());
    }

    fn record_rejection(&self) {
        self.events.lock().push("rejected".to_string());
    }
}

#[test]
fn metric_sink_observes_the_full_cycle() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(1)
        .reset_timeout(Duration::ZERO)
        .half_open_max_calls(1)
        .metric_sink(RecordingSink {
            events: Arc::clone(&events),
        })
        .build();

    assert!(breaker.call(fail).is_err());
    assert!(breaker.call(succeed).is_ok());

    let events = events.lock();
    assert_eq!(
        *events,
        vec![
            "err".to_string(),
            "closed -> open".to_string(),
            "open -> half-open".to_string(),
            "ok".to_string(),
            "half-open -> closed".to_string(),
        ]
    );
}

#[test]
#[should_panic(expected = "max_failures must be at least 1")]
fn builder_rejects_zero_max_failures() {
    let _ = CircuitBreaker::<TestError>::builder().max_failures(0).build();
}

#[test]
fn builder_configures_a_working_breaker() {
    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(10)
        .reset_timeout(Duration::from_secs(5))
        .half_open_max_calls(4)
        .build();

    assert_eq!(breaker.current_state(), State::Closed);
    assert!(breaker.call(succeed).is_ok());
}

// The retry collaborator wraps the breaker from the outside: rejections
// are retried until the cooldown elapses and the probe succeeds.
#[test]
fn retry_waits_out_an_open_circuit() {
    use tripswitch::RetryPolicy;

    let breaker = CircuitBreaker::<TestError>::builder()
        .max_failures(1)
        .reset_timeout(Duration::from_millis(50))
        .half_open_max_calls(1)
        .build();

    assert!(breaker.call(fail).is_err());
    assert_eq!(breaker.current_state(), State::Open);

    let retry = RetryPolicy::new(5)
        .initial_delay(Duration::from_millis(30))
        .multiplier(2.0);

    let result = retry.run_if(
        || breaker.call(succeed),
        |e| matches!(e, BreakerError::Open),
    );

    assert!(result.is_ok());
    assert_eq!(breaker.current_state(), State::Closed);
}

#[cfg(feature = "async")]
mod async_tests {
    use super::*;

    #[tokio::test]
    async fn async_calls_trip_and_reject() {
        let breaker = CircuitBreaker::<TestError>::builder()
            .max_failures(2)
            .reset_timeout(Duration::from_secs(60))
            .build();

        for _ in 0..2 {
            let result = breaker.call_async(|| async { fail() }).await;
            assert!(matches!(result, Err(BreakerError::Operation(_))));
        }

        assert_eq!(breaker.current_state(), State::Open);

        let result = breaker.call_async(|| async { succeed() }).await;
        assert!(matches!(result, Err(BreakerError::Open)));
    }

    #[tokio::test]
    async fn async_half_open_recovery() {
        let breaker = CircuitBreaker::<TestError>::builder()
            .max_failures(1)
            .reset_timeout(Duration::ZERO)
            .half_open_max_calls(1)
            .build();

        let _ = breaker.call_async(|| async { fail() }).await;
        assert_eq!(breaker.current_state(), State::Open);

        let result = breaker.call_async(|| async { succeed() }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.current_state(), State::Closed);
    }

    #[tokio::test]
    async fn async_retry_waits_out_an_open_circuit() {
        use tripswitch::RetryPolicy;

        let breaker = CircuitBreaker::<TestError>::builder()
            .max_failures(1)
            .reset_timeout(Duration::from_millis(50))
            .half_open_max_calls(1)
            .build();

        let _ = breaker.call_async(|| async { fail() }).await;
        assert_eq!(breaker.current_state(), State::Open);

        let retry = RetryPolicy::new(5)
            .initial_delay(Duration::from_millis(30))
            .multiplier(2.0);

        let result = retry
            .run_if_async(
                || breaker.call_async(|| async { succeed() }),
                |e| matches!(e, BreakerError::Open),
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(breaker.current_state(), State::Closed);
    }
}
