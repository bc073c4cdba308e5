//! Advanced Circuit Breaker Example
//!
//! This example demonstrates:
//! 1. Creating a custom error type
//! 2. Using hooks for monitoring circuit breaker events
//! 3. Tuning the half-open probe threshold
//! 4. Composing a retry-with-backoff policy around the breaker

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tripswitch::{BreakerError, CircuitBreaker, HookRegistry, RetryPolicy};

// Custom error type that implements Error trait
#[derive(Debug)]
struct ServiceError(String);

impl ServiceError {
    fn new(msg: &str) -> Self {
        ServiceError(msg.to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service error: {}", self.0)
    }
}

impl Error for ServiceError {}

// A service that fails for a while and then recovers
fn external_service_call(calls: &AtomicU32) -> Result<String, ServiceError> {
    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;

    if n <= 2 {
        Ok("initial success".to_string())
    } else if n <= 6 {
        Err(ServiceError::new("service temporarily unavailable"))
    } else {
        Ok("service recovered".to_string())
    }
}

fn main() {
    println!("=== Advanced Circuit Breaker Example ===\n");

    // 1. Set up a hook registry for observability
    let hooks = HookRegistry::new();

    hooks.set_on_open(|| println!("[hook] circuit OPENED after too many failures"));
    hooks.set_on_close(|| println!("[hook] circuit CLOSED after successful recovery"));
    hooks.set_on_half_open(|| println!("[hook] circuit HALF-OPEN, probing the service"));
    hooks.set_on_rejected(|| println!("[hook] call rejected, circuit open"));

    // 2. Create a circuit breaker with custom thresholds
    let breaker = CircuitBreaker::<ServiceError>::builder()
        .max_failures(3)
        .reset_timeout(Duration::from_secs(1))
        .half_open_max_calls(2)
        .hooks(hooks)
        .build();

    println!("Initial state: {:?}\n", breaker.current_state());

    let calls = Arc::new(AtomicU32::new(0));

    // 3. Drive the breaker through its full cycle: rejections are retried
    //    with exponential backoff until the cooldown admits a probe
    let retry = RetryPolicy::new(4)
        .initial_delay(Duration::from_millis(400))
        .multiplier(2.0);

    for i in 1..=10 {
        println!("--- Call {} ---", i);

        let calls = Arc::clone(&calls);
        let result = retry.run_if(
            || breaker.call(|| external_service_call(&calls)),
            // Only rejections heal by waiting; service errors go straight
            // back to the caller
            |e| matches!(e, BreakerError::Open),
        );

        match result {
            Ok(response) => println!("service response: {}", response),
            Err(BreakerError::Open) => println!("gave up, circuit still open"),
            Err(BreakerError::Operation(err)) => println!("{}", err),
        }

        println!(
            "state: {:?}, failures: {}, probe successes: {}\n",
            breaker.current_state(),
            breaker.failure_count(),
            breaker.success_count()
        );
    }

    println!("=== Example Completed ===");
}
