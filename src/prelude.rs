//! Re-exports common types for convenient usage.
//!
//! # Example
//! ```rust,no_run
//! use tripswitch::prelude::*;
//! ```

pub use crate::error::{BreakerError, BreakerResult};
pub use crate::retry::RetryPolicy;
pub use crate::state::State;
pub use crate::CircuitBreaker;
