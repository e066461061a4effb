//! Request pacing for the catalog client.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};

/// Limits throughput to a fixed number of requests per second.
///
/// A single-permit [`Semaphore`] serializes callers; each holds the permit
/// for one interval.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    interval: Duration,
}

impl RateLimiter {
    /// Creates a limiter allowing at most `requests_per_second` requests
    /// per second. Zero is treated as one.
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            interval: Duration::from_millis(1000 / u64::from(requests_per_second.max(1))),
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a request slot is available, then holds the slot for
    /// the configured interval.
    pub async fn acquire(&self) {
        // The semaphore is never closed.
        let Ok(_permit) = self.semaphore.acquire().await else {
            return;
        };
        sleep(self.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_interval_from_rate() {
        assert_eq!(RateLimiter::new(10).interval(), Duration::from_millis(100));
        assert_eq!(RateLimiter::new(0).interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_acquire_spaces_requests() {
        let limiter = RateLimiter::new(20);
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
