//! Bounded exponential backoff with random jitter
//!
//! Retry wraps rate-limit-then-fetch as explicit composition, so the
//! ordering is visible and testable. Adapters never retry internally.

use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::error::{FetchError, FetchFailed};

/// Delay before attempt k (k >= 2) is `base_delay * 2^(k-2)` plus up to
/// one second of uniform jitter, which keeps concurrently-retrying
/// symbols from synchronizing into retry storms.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Runs `op` until it succeeds or the attempt budget is exhausted.
    /// The last error is wrapped and propagated, not swallowed.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, FetchFailed>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let budget = self.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= budget => {
                    return Err(FetchFailed {
                        attempts: attempt,
                        last: err,
                    });
                }
                Err(err) => {
                    let delay =
                        self.base_delay.mul_f64(2f64.powi((attempt - 1) as i32)) + jitter();
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "fetch attempt failed, backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

fn jitter() -> Duration {
    use rand::Rng;
    Duration::from_secs_f64(rand::rng().random_range(0.0..1.0))
}
