//! Rate controller
//!
//! Decides how long to pause before the next request and performs the
//! pause. A successful page always costs the baseline delay; transient
//! failures escalate the delay up to a cap until the next success.

use crate::config::PacingConfig;
use crate::error::{Error, Result};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::types::BackoffType;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// What the last fetch attempt produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Success,
    RateLimited { retry_after: Option<Duration> },
    ServerError,
    NetworkError,
}

impl PageOutcome {
    /// Outcome for a failure that `Error::is_retryable` accepted
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::RateLimited {
                retry_after_seconds,
            } => Self::RateLimited {
                retry_after: retry_after_seconds.map(Duration::from_secs),
            },
            Error::Network(_) => Self::NetworkError,
            _ => Self::ServerError,
        }
    }
}

/// Computes inter-request delays
#[derive(Debug, Clone)]
pub struct RateController {
    baseline: Duration,
    max_delay: Duration,
    backoff: BackoffType,
    tick: Duration,
    attempts: u32,
    last_delay: Duration,
}

impl RateController {
    /// Create a controller from pacing settings
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            baseline: config.page_delay(),
            max_delay: config.max_delay().max(config.page_delay()),
            backoff: config.backoff,
            tick: config.tick(),
            attempts: 0,
            last_delay: Duration::ZERO,
        }
    }

    /// Consecutive failures since the last success
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay to apply before the next request
    pub fn next_delay(&mut self, outcome: &PageOutcome) -> Duration {
        let retry_after = match outcome {
            PageOutcome::Success => {
                self.attempts = 0;
                self.last_delay = Duration::ZERO;
                return self.baseline;
            }
            PageOutcome::RateLimited { retry_after } => *retry_after,
            PageOutcome::ServerError | PageOutcome::NetworkError => None,
        };

        self.attempts += 1;
        let escalated = self.escalate(self.attempts);
        let delay = escalated
            .max(retry_after.unwrap_or(Duration::ZERO))
            .max(self.last_delay)
            .min(self.max_delay);
        self.last_delay = delay;
        delay
    }

    /// Sleep for `delay`, ticking countdown events, unless cancelled
    pub async fn wait(
        &self,
        delay: Duration,
        cancel: &CancellationToken,
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        let deadline = Instant::now() + delay;
        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = &mut sleep => return Ok(()),
                _ = ticker.tick() => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    reporter.report(&ProgressEvent::Waiting { remaining });
                }
            }
        }
    }

    fn escalate(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffType::Constant => self.baseline,
            BackoffType::Linear => self.baseline.saturating_mul(attempt + 1),
            BackoffType::Exponential => self.baseline.saturating_mul(2u32.saturating_pow(attempt)),
        }
    }
}
