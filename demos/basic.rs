use std::error::Error;
use std::fmt;
use std::thread;
use std::time::Duration;

use tripswitch::{BreakerError, CircuitBreaker};

// Custom error type that implements Error trait
#[derive(Debug)]
struct ServiceError(String);

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service error: {}", self.0)
    }
}

impl Error for ServiceError {}

fn main() {
    // Trip after 3 consecutive failures, stay open for 2 seconds
    let breaker = CircuitBreaker::<ServiceError>::new(3, Duration::from_secs(2));

    println!("Circuit initial state: {:?}", breaker.current_state());

    // Simulate a failing dependency: the first three failures trip the
    // circuit, the remaining calls are rejected without being attempted
    for i in 1..=5 {
        let result = breaker.call(|| -> Result<(), ServiceError> {
            Err(ServiceError("service unavailable".to_string()))
        });

        match result {
            Ok(()) => println!("Call {} succeeded", i),
            Err(BreakerError::Open) => {
                println!("Call {} rejected: circuit is open", i);
            }
            Err(BreakerError::Operation(err)) => {
                println!("Call {} failed: {}", i, err);
            }
        }

        println!(
            "  state: {:?}, consecutive failures: {}",
            breaker.current_state(),
            breaker.failure_count()
        );

        thread::sleep(Duration::from_millis(500));
    }

    // Wait out the cooldown, then probe with a recovered service
    println!("\nWaiting for the circuit breaker to cool down...");
    thread::sleep(Duration::from_secs(3));

    match breaker.call(|| {
        println!("Service call executed");
        Ok::<_, ServiceError>(())
    }) {
        Ok(()) => println!(
            "Recovery probe succeeded, state is now {:?}",
            breaker.current_state()
        ),
        Err(err) => println!("Error: {}", err),
    }
}
