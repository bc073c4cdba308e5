//! # tripswitch
//!
//! A concurrency-safe, lock-disciplined Circuit Breaker library for Rust
//! applications, with a retry-with-backoff helper for composing resilient
//! call sites.
//!
//! ## What is a Circuit Breaker?
//!
//! The Circuit Breaker pattern helps prevent cascading failures by
//! temporarily refusing to invoke a dependency that keeps failing. It
//! operates in three states:
//!
//! - **Closed**: Normal operation. Calls pass through and consecutive
//!   failures are counted.
//! - **Open**: Calls are immediately rejected without attempting to reach
//!   the resource.
//! - **Half-Open**: After a cooldown period, calls are admitted as recovery
//!   probes; enough consecutive successes close the circuit again.
//!
//! The breaker holds its internal lock only while deciding admission and
//! while recording an outcome. The protected operation always runs with the
//! lock released, so a slow call never blocks other callers from checking
//! circuit state.
//!
//! ## Basic Usage
//!
//! ```rust
//! use tripswitch::{BreakerError, CircuitBreaker};
//! use std::error::Error;
//! use std::fmt;
//! use std::time::Duration;
//!
//! // Define a custom error type that implements the Error trait
//! #[derive(Debug)]
//! struct ServiceError(String);
//!
//! impl fmt::Display for ServiceError {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "service error: {}", self.0)
//!     }
//! }
//!
//! impl Error for ServiceError {}
//!
//! // Trip after 3 consecutive failures, stay open for 2 seconds
//! let breaker = CircuitBreaker::<ServiceError>::new(3, Duration::from_secs(2));
//!
//! match breaker.call(|| {
//!     // Your service call that might fail
//!     Ok("success".to_string())
//! }) {
//!     Ok(result) => println!("call succeeded: {}", result),
//!     Err(BreakerError::Open) => println!("circuit is open, call was not attempted"),
//!     Err(BreakerError::Operation(err)) => println!("call failed: {}", err),
//! }
//! ```
//!
//! ## Retrying around the breaker
//!
//! The breaker never retries internally. Wrap it with a [`RetryPolicy`] and
//! decide which errors are worth retrying:
//!
//! ```rust
//! use tripswitch::{BreakerError, CircuitBreaker, RetryPolicy};
//! # use std::fmt;
//! # #[derive(Debug)]
//! # struct ServiceError(String);
//! # impl fmt::Display for ServiceError {
//! #     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//! #         write!(f, "service error: {}", self.0)
//! #     }
//! # }
//! # impl std::error::Error for ServiceError {}
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::<ServiceError>::new(3, Duration::from_millis(50));
//! let retry = RetryPolicy::new(3).initial_delay(Duration::from_millis(10));
//!
//! let result = retry.run_if(
//!     || breaker.call(|| Ok::<_, ServiceError>(42)),
//!     // Rejections heal once the cooldown elapses; retry those only.
//!     |e| matches!(e, BreakerError::Open),
//! );
//! assert_eq!(result.unwrap(), 42);
//! ```
//!
//! ## Features
//!
//! - `std` - Standard library support (default)
//! - `async` - Async call and retry support with Tokio
//! - `tracing` - A `TracingMetricSink` emitting breaker events as
//!   `tracing` events

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod breaker;
mod config;
mod error;
mod hook;
mod metrics;
pub mod prelude;
mod retry;
mod state;

// Re-exports
pub use breaker::CircuitBreaker;
pub use config::BreakerBuilder;
pub use error::{BreakerError, BreakerResult};
pub use hook::HookRegistry;
pub use metrics::{MetricSink, NullMetricSink};
#[cfg(feature = "tracing")]
pub use metrics::TracingMetricSink;
pub use retry::RetryPolicy;
pub use state::State;
