//! Request pacing
//!
//! Uses the governor crate for a token bucket that caps how often the
//! transport may hit the remote API, whatever the engine's delays say.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

/// Request ceiling: sustained rate plus the burst allowed on top of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1,
            burst_size: 2,
        }
    }
}

impl RateLimiterConfig {
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

type DirectGovernor = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Shared token bucket in front of every transport call
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DirectGovernor>,
}

impl RateLimiter {
    /// Build the bucket; zero values are clamped to one
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            bucket: Arc::new(Governor::direct(quota)),
        }
    }

    /// Take a token, suspending until one is available
    pub async fn wait(&self) {
        if self.bucket.check().is_ok() {
            return;
        }
        debug!("Request ceiling reached; holding the next call");
        self.bucket.until_ready().await;
    }

    /// Take a token only if one is available now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}
