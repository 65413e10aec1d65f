//! Harvest configuration
//!
//! Runtime knobs for the transport, pacing and output layers. Every field has
//! a default so a config file only needs to name what it overrides.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base URL of the private web API
pub const DEFAULT_API_BASE_URL: &str = "https://www.instagram.com/api/v1";

/// Device identity presented on every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148 Instagram 250.0.0.17.109 \
(iPhone14,5; iOS 16_0; en_US; en-US; scale=3.00; 1170x2532; 165586599)";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete harvest configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Inter-page delay and retry policy
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Hard ceiling on request cadence
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Where result files go
    #[serde(default)]
    pub output: OutputConfig,
}

impl HarvestConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine misbehave
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::config("api.base_url must not be empty"));
        }
        if self.pacing.max_delay_ms < self.pacing.page_delay_ms {
            return Err(Error::config(
                "pacing.max_delay_ms must be at least pacing.page_delay_ms",
            ));
        }
        if self.pacing.tick_ms == 0 {
            return Err(Error::config("pacing.tick_ms must be positive"));
        }
        Ok(())
    }

    /// Override the API base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }

    /// Override the baseline inter-page delay
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.pacing.page_delay_ms = delay.as_millis() as u64;
        if self.pacing.max_delay_ms < self.pacing.page_delay_ms {
            self.pacing.max_delay_ms = self.pacing.page_delay_ms;
        }
        self
    }

    /// Override the escalation cap
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.pacing.max_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Override the retry ceiling
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.pacing.max_retries = retries;
        self
    }

    /// Override the countdown tick interval
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.pacing.tick_ms = (tick.as_millis() as u64).max(1);
        self
    }

    /// Override the results directory
    #[must_use]
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.results_dir = dir.into();
        self
    }

    /// Disable the request pacing ceiling
    #[must_use]
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit.enabled = false;
        self
    }

    /// Transport settings derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api.base_url)
            .user_agent(&self.api.user_agent)
            .timeout(Duration::from_secs(self.api.timeout_seconds));
        builder = if self.rate_limit.enabled {
            builder.rate_limit(RateLimiterConfig::new(
                self.rate_limit.requests_per_second,
                self.rate_limit.burst_size,
            ))
        } else {
            builder.no_rate_limit()
        };
        builder.build()
    }
}

// ============================================================================
// API
// ============================================================================

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for API requests
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User agent presented on every call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Page size hint sent with each comments request
    #[serde(default = "default_page_size_hint")]
    pub page_size_hint: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            page_size_hint: default_page_size_hint(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size_hint() -> u32 {
    50
}

// ============================================================================
// Pacing
// ============================================================================

/// Inter-page delay and retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay after every successful page, in milliseconds
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// How failure delays grow
    #[serde(default)]
    pub backoff: BackoffType,

    /// Cap on escalated delays, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Consecutive transient failures tolerated for one cursor
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Countdown tick interval, in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl PacingConfig {
    /// Baseline inter-page delay
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Escalation cap
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Countdown tick interval
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            backoff: BackoffType::Exponential,
            max_delay_ms: default_max_delay_ms(),
            max_retries: default_max_retries(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_page_delay_ms() -> u64 {
    5_000
}

fn default_max_delay_ms() -> u64 {
    120_000
}

fn default_max_retries() -> u32 {
    5
}

fn default_tick_ms() -> u64 {
    1_000
}

// ============================================================================
// Rate Limit
// ============================================================================

/// Token bucket ceiling applied to every outgoing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the ceiling is applied at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests per second limit
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst size
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rps() -> u32 {
    1
}

fn default_burst() -> u32 {
    2
}

// ============================================================================
// Output
// ============================================================================

/// Result file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving CSV files
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarvestConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.page_size_hint, 50);
        assert_eq!(config.pacing.page_delay(), Duration::from_secs(5));
        assert_eq!(config.pacing.max_delay(), Duration::from_secs(120));
        assert_eq!(config.pacing.max_retries, 5);
        assert_eq!(config.pacing.backoff, BackoffType::Exponential);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.output.results_dir, PathBuf::from("results"));
    }

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{
            "pacing": { "page_delay_ms": 2000, "max_retries": 3 },
            "output": { "results_dir": "/tmp/harvest" }
        }"#;

        let config = HarvestConfig::from_json(json).unwrap();
        assert_eq!(config.pacing.page_delay_ms, 2000);
        assert_eq!(config.pacing.max_retries, 3);
        assert_eq!(config.pacing.max_delay_ms, 120_000);
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.output.results_dir, PathBuf::from("/tmp/harvest"));
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let json = r#"{ "pacing": { "page_delay_ms": 5000, "max_delay_ms": 100 } }"#;
        let err = HarvestConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains("max_delay_ms"));
    }

    #[test]
    fn test_with_page_delay_raises_cap() {
        let config = HarvestConfig::new()
            .with_max_delay(Duration::from_secs(1))
            .with_page_delay(Duration::from_secs(10));
        assert_eq!(config.pacing.max_delay(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_client_config_from_harvest_config() {
        let config = HarvestConfig::new()
            .with_base_url("http://localhost:1234/api/v1")
            .without_rate_limit();
        let http = config.http_client_config();
        assert_eq!(http.base_url, Some("http://localhost:1234/api/v1".to_string()));
        assert_eq!(http.user_agent, DEFAULT_USER_AGENT);
        assert!(http.rate_limit.is_none());
    }
}
