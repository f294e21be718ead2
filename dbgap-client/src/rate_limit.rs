//! Token bucket rate limiter for NCBI E-utilities
//!
//! NCBI allows 3 requests per second without an API key and 10 with one.
//! Exceeding the limit gets the caller's IP temporarily blocked, so every
//! request made by [`GapClient`](crate::GapClient) waits on this limiter first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

/// Rate limiter shared by clones of a client
#[derive(Clone, Debug)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Time until one full token is available
    fn deficit(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
        }
    }
}

impl RateLimiter {
    /// Create a limiter allowing `rate` requests per second
    ///
    /// Non-positive or non-finite rates fall back to the NCBI default of 3.
    /// The bucket holds at least one token so the first request never waits.
    ///
    /// ```
    /// use dbgap_client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(3.0);
    /// ```
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            3.0
        };
        let capacity = rate.max(1.0);

        Self {
            bucket: Arc::new(Mutex::new(TokenBucket {
                tokens: capacity,
                capacity,
                refill_rate: rate,
                last_refill: Instant::now(),
            })),
        }
    }

    /// 3 requests/second, the limit for callers without an API key
    pub fn ncbi_default() -> Self {
        Self::new(3.0)
    }

    /// 10 requests/second, the limit for callers with an API key
    pub fn ncbi_with_key() -> Self {
        Self::new(10.0)
    }

    /// Wait until a token is available and consume it
    #[instrument(skip(self))]
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        bucket.refill();

        let wait = bucket.deficit();
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit token");
            // Lock is held across the sleep
            sleep(wait).await;
            bucket.refill();
        }

        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
        debug!(remaining_tokens = bucket.tokens, "Rate limit token acquired");
    }

    /// Tokens currently available, after refilling
    pub async fn available_tokens(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill();
        bucket.tokens
    }

    /// Configured requests per second
    pub async fn rate(&self) -> f64 {
        self.bucket.lock().await.refill_rate
    }
}
