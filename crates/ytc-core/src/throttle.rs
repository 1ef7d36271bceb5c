//! Pacing of lookups in a batch.
//!
//! The batch driver calls [`Throttle::acquire`] before every item, passing
//! the item's 0-based position. How (and whether) that call waits is up to
//! the implementation.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::{ThrottleConfig, ThrottleMode};

#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until item `position` of the current batch may start.
    async fn acquire(&self, position: usize);

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Sleep a fixed delay between items: never before the first, so never
/// after the last.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn acquire(&self, position: usize) {
        if position > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn describe(&self) -> String {
        format!("fixed {}ms", self.delay.as_millis())
    }
}

/// Token bucket: sustained `per_second` requests with bursts up to `burst`.
/// Every item takes a permit, the first one included.
pub struct TokenBucket {
    limiter: DefaultDirectRateLimiter,
    per_second: NonZeroU32,
    burst: NonZeroU32,
}

impl TokenBucket {
    pub fn new(per_second: u32, burst: u32) -> Self {
        let per_second = NonZeroU32::new(per_second.max(1)).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst.max(1)).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst)),
            per_second,
            burst,
        }
    }
}

#[async_trait]
impl Throttle for TokenBucket {
    async fn acquire(&self, _position: usize) {
        self.limiter.until_ready().await;
    }

    fn describe(&self) -> String {
        format!("token bucket {}/s burst {}", self.per_second, self.burst)
    }
}

/// Build the throttle selected in config.
pub fn from_config(cfg: &ThrottleConfig) -> Box<dyn Throttle> {
    match cfg.mode {
        ThrottleMode::Fixed => Box::new(FixedDelay::new(Duration::from_millis(cfg.delay_ms))),
        ThrottleMode::TokenBucket => {
            Box::new(TokenBucket::new(cfg.requests_per_second, cfg.burst))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn fixed_delay_skips_first_item() {
        let t = FixedDelay::new(Duration::from_millis(200));
        let start = Instant::now();
        t.acquire(0).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn zero_fixed_delay_returns_immediately() {
        let t = FixedDelay::new(Duration::ZERO);
        let start = Instant::now();
        t.acquire(1).await;
        t.acquire(2).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn fixed_delay_sleeps_between_items() {
        let t = FixedDelay::new(Duration::from_millis(30));
        let start = Instant::now();
        t.acquire(1).await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn token_bucket_allows_burst_then_paces() {
        let t = TokenBucket::new(10, 2);
        let start = Instant::now();
        t.acquire(0).await;
        t.acquire(1).await;
        assert!(start.elapsed() < Duration::from_millis(50), "burst of 2 should not wait");
        t.acquire(2).await;
        assert!(start.elapsed() >= Duration::from_millis(50), "third permit must wait");
    }

    #[tokio::test]
    async fn token_bucket_first_item_takes_a_permit() {
        let t = TokenBucket::new(10, 1);
        let start = Instant::now();
        t.acquire(0).await;
        t.acquire(1).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn from_config_picks_mode() {
        let fixed = from_config(&ThrottleConfig::default());
        assert_eq!(fixed.describe(), "fixed 500ms");

        let bucket = from_config(&ThrottleConfig {
            mode: ThrottleMode::TokenBucket,
            requests_per_second: 4,
            burst: 2,
            ..ThrottleConfig::default()
        });
        assert_eq!(bucket.describe(), "token bucket 4/s burst 2");

        // Zero rates are clamped to one rather than rejected.
        let clamped = from_config(&ThrottleConfig {
            mode: ThrottleMode::TokenBucket,
            requests_per_second: 0,
            burst: 0,
            ..ThrottleConfig::default()
        });
        assert_eq!(clamped.describe(), "token bucket 1/s burst 1");
    }
}
