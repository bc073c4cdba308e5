//! Error types for the circuit breaker library.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result type for circuit breaker operations.
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;

/// Error type for circuit breaker operations.
///
/// Rejection is distinct from operation failure so callers can tell "not
/// attempted" apart from "attempted and failed". The operation's own error
/// is carried unchanged, never wrapped or rewritten.
#[derive(Debug)]
pub enum BreakerError<E> {
    /// The circuit is open; the operation was not attempted.
    Open,

    /// The underlying operation ran and failed.
    Operation(E),
}

impl<E> Display for BreakerError<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BreakerError::Open => write!(f, "circuit breaker is open"),
            BreakerError::Operation(e) => write!(f, "operation error: {}", e),
        }
    }
}

impl<E: Error + 'static> Error for BreakerError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BreakerError::Open => None,
            BreakerError::Operation(e) => Some(e),
        }
    }
}
