// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Request Rate Limiter
 * Token bucket pacing with jittered delays to avoid WAF detection
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use nonzero_ext::*;
use parking_lot::RwLock;
use rand::Rng;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::ScannerError;

type DirectLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token-bucket pacing with a jittered post-grant sleep. Burst size is
/// pinned to 1; the jitter window breaks the fixed inter-request interval
/// that rate-based WAF rules key on.
pub struct RateLimiter {
    limiter: RwLock<Arc<DirectLimiter>>,
    min_delay: Duration,
    max_delay: Duration,
}

impl RateLimiter {
    /// `requests_per_second` caps sustained throughput; the delay window
    /// [min_delay, max_delay) adds per-request jitter on top.
    pub fn new(requests_per_second: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            limiter: RwLock::new(Arc::new(Self::build_limiter(requests_per_second))),
            min_delay,
            max_delay,
        }
    }

    fn build_limiter(rps: u32) -> DirectLimiter {
        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(nonzero!(1u32)))
            .allow_burst(nonzero!(1u32));
        GovernorRateLimiter::direct(quota)
    }

    /// Block until a request may be sent. Both the token wait and the
    /// jitter sleep abort promptly once `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), ScannerError> {
        let limiter = Arc::clone(&self.limiter.read());

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ScannerError::RateLimitAborted),
            () = limiter.until_ready() => {}
        }

        let delay = self.jittered_delay();
        if delay > Duration::ZERO {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ScannerError::RateLimitAborted),
                () = tokio::time::sleep(delay) => {}
            }
        }

        Ok(())
    }

    fn jittered_delay(&self) -> Duration {
        if self.max_delay > self.min_delay {
            let window = (self.max_delay - self.min_delay).as_millis() as u64;
            let jitter = rand::rng().random_range(0..window.max(1));
            self.min_delay + Duration::from_millis(jitter)
        } else {
            self.min_delay
        }
    }

    /// Swap in a new rate. The replacement is atomic from the caller's
    /// perspective; waiters already parked on the old bucket finish
    /// against the old quota.
    pub fn set_rate(&self, requests_per_second: u32) {
        debug!("Rate limit updated to {} req/s", requests_per_second);
        *self.limiter.write() = Arc::new(Self::build_limiter(requests_per_second));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_acquire_grants_token() {
        let limiter = RateLimiter::new(100, Duration::ZERO, Duration::ZERO);
        let cancel = CancellationToken::new();
        assert!(limiter.acquire(&cancel).await.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_respects_cancellation() {
        // 1 req/s with burst 1: the second acquire must park, then abort.
        let limiter = RateLimiter::new(1, Duration::ZERO, Duration::ZERO);
        let cancel = CancellationToken::new();

        limiter.acquire(&cancel).await.unwrap();

        cancel.cancel();
        let start = Instant::now();
        let result = limiter.acquire(&cancel).await;
        assert!(matches!(result, Err(ScannerError::RateLimitAborted)));
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_fixed_delay_without_jitter_window() {
        let limiter = RateLimiter::new(1000, Duration::from_millis(20), Duration::from_millis(20));
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_jitter_stays_in_window() {
        let limiter = RateLimiter::new(1000, Duration::from_millis(1), Duration::from_millis(5));
        for _ in 0..20 {
            let delay = limiter.jittered_delay();
            assert!(delay >= Duration::from_millis(1));
            assert!(delay < Duration::from_millis(5));
        }
    }

    #[tokio::test]
    async fn test_set_rate_swaps_bucket() {
        let limiter = RateLimiter::new(1, Duration::ZERO, Duration::ZERO);
        let cancel = CancellationToken::new();

        limiter.acquire(&cancel).await.unwrap();
        limiter.set_rate(1000);

        // Fresh bucket grants immediately.
        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
