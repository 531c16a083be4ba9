//! Token bucket rate limiting for outbound API requests

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

use super::errors::LlmError;

/// Shared token bucket in front of an API client
///
/// Each `acquire` waits until one request may be sent. Up to `burst_size`
/// requests may go out back to back before the sustained rate applies.
pub struct TokenBucketRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl TokenBucketRateLimiter {
    /// Create a limiter allowing `requests_per_second` with bursts of `burst_size`
    ///
    /// # Example
    /// ```
    /// use cielo::infrastructure::llm::TokenBucketRateLimiter;
    ///
    /// let limiter = TokenBucketRateLimiter::new(10.0, 20).unwrap();
    /// ```
    pub fn new(requests_per_second: f64, burst_size: u32) -> Result<Self, LlmError> {
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return Err(LlmError::Configuration(format!(
                "requests_per_second must be positive, got {requests_per_second}"
            )));
        }
        let burst = NonZeroU32::new(burst_size).ok_or_else(|| {
            LlmError::Configuration("burst_size must be at least 1".to_string())
        })?;
        let period = Duration::from_secs_f64(1.0 / requests_per_second);
        let quota = Quota::with_period(period)
            .ok_or_else(|| {
                LlmError::Configuration(format!(
                    "requests_per_second {requests_per_second} is too high"
                ))
            })?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::direct(quota),
        })
    }

    /// Wait until a request may be sent
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a slot without waiting, returning whether one was free
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
