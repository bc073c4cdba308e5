//! Retry with exponential backoff.
//!
//! Retrying is deliberately separate from the breaker: the breaker never
//! retries internally, it only reacts to outcomes. A [`RetryPolicy`] wraps
//! calls from the outside, and composes naturally with
//! [`CircuitBreaker::call`](crate::CircuitBreaker::call) by treating the
//! open-circuit rejection as a retryable condition while the cooldown runs
//! out.

use std::time::Duration;

/// An exponential backoff schedule for retrying fallible operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy that makes at most `max_attempts` attempts in total.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Sets the delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the factor the delay grows by after each retry.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the ceiling the growing delay saturates at.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Runs `f`, retrying every failure until an attempt succeeds or the
    /// attempt budget is exhausted. Returns the last error verbatim.
    pub fn run<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.run_if(f, |_| true)
    }

    /// Runs `f`, retrying only failures for which `should_retry` returns
    /// `true`.
    ///
    /// A non-retryable error is returned immediately, mirroring the usual
    /// temporary-versus-permanent split: a malformed request will not heal
    /// by waiting, an open circuit will.
    pub fn run_if<F, T, E, P>(&self, mut f: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;

        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !should_retry(&e) || attempt >= self.max_attempts {
                        return Err(e);
                    }

                    std::thread::sleep(delay);
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Async variant of [`run_if`](Self::run_if), sleeping on the tokio
    /// timer between attempts.
    #[cfg(feature = "async")]
    #[cfg_attr(docsrs, doc(cfg(feature = "async")))]
    pub async fn run_if_async<F, Fut, T, E, P>(&self, mut f: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;

        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !should_retry(&e) || attempt >= self.max_attempts {
                        return Err(e);
                    }

                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
            }
        }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max_delay)
    }
}
