// Fixed-interval rate limiter for catalog calls.
//
// Jikan throttles clients at roughly 3 requests per second and 60 per
// minute. Every request goes through this limiter, which keeps consecutive
// calls at least `interval` apart. One "similar" request makes up to five
// calls.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Default spacing between catalog requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Keeps consecutive requests at least `interval` apart.
#[derive(Clone)]
pub struct RateLimiter {
    /// Minimum time between requests
    interval: Duration,
    /// When the last request was allowed through
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum spacing between requests.
    ///
    /// A zero interval disables throttling, which is handy against a local
    /// mock server.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Wait until a request is allowed, then return.
    ///
    /// The first request goes through immediately. Later requests sleep for
    /// whatever is left of the interval since the previous one.
    pub async fn acquire(&self) {
        let mut last_request = self.last_request.lock().await;

        if let Some(last) = *last_request {
            let elapsed = Instant::now().duration_since(last);
            if elapsed < self.interval {
                // Hold the lock while sleeping so queued callers stay in order
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }

        *last_request = Some(Instant::now());
    }
}
