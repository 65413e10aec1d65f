//! Authenticated transport client
//!
//! Issues GET requests with a fixed device identity and the session cookie,
//! then classifies the outcome:
//! - 2xx becomes the decoded body
//! - 401/403 become `Unauthorized`
//! - 429 becomes `RateLimited`
//! - 5xx becomes `ServerError`
//! - transport failures become `Network`
//!
//! Nothing here retries.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::config::DEFAULT_USER_AGENT;
use crate::error::{Error, Result};
use crate::types::Session;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Path of the lightweight authenticated probe
const PROBE_PATH: &str = "accounts/current_user/";

/// Longest body excerpt kept in `HttpStatus` errors
const BODY_EXCERPT_LEN: usize = 200;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative request paths
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, sent in key order
    pub query: BTreeMap<String, String>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter when a value is present
    #[must_use]
    pub fn query_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }
}

/// Authenticated HTTP client
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    session: Session,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client bound to one session
    pub fn new(config: HttpClientConfig, session: Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            session,
            rate_limiter,
        })
    }

    /// The session this client authenticates with
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// GET an API path and decode the JSON body
    pub async fn request(&self, path: &str, config: RequestConfig) -> Result<Value> {
        let url = self.build_url(path);
        let response = self.send(&url, &config).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::malformed(format!("{url} did not return JSON: {e}")))
    }

    /// GET a page and return its raw body
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let url = self.build_url(url);
        let response = self.send(&url, &RequestConfig::default()).await?;
        Ok(response.text().await?)
    }

    /// Probe whether the session is accepted
    ///
    /// Classified refusals map to `false`; only transport failures are errors.
    pub async fn validate_session(&self) -> Result<bool> {
        if self.session.is_empty() {
            warn!("Session token is empty");
            return Ok(false);
        }

        match self.request(PROBE_PATH, RequestConfig::default()).await {
            Ok(_) => {
                debug!("Session accepted by probe");
                Ok(true)
            }
            Err(Error::Network(e)) => Err(Error::Network(e)),
            Err(Error::Unauthorized { message }) => {
                warn!("Session rejected: {message}");
                Ok(false)
            }
            Err(Error::RateLimited { .. }) => {
                warn!("Session is rate-limited by the remote");
                Ok(false)
            }
            Err(e) => {
                warn!("Session probe failed: {e}");
                Ok(false)
            }
        }
    }

    async fn send(&self, url: &str, config: &RequestConfig) -> Result<Response> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self
            .client
            .get(url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(COOKIE, format!("sessionid={}", self.session.token()));

        if !config.query.is_empty() {
            req = req.query(&config.query);
        }

        let response = req.send().await?;
        let status = response.status();
        debug!("GET {} -> {}", url, status.as_u16());

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = extract_retry_after(&response);
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, retry_after, &body))
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Map a non-success status onto the error taxonomy
fn classify_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::unauthorized(format!(
            "HTTP {}: session is invalid, expired or restricted",
            status.as_u16()
        )),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            retry_after_seconds: retry_after,
        },
        StatusCode::NOT_FOUND => Error::not_found(format!("HTTP 404: {}", excerpt(body))),
        s if s.is_server_error() => Error::ServerError { status: s.as_u16() },
        s => Error::http_status(s.as_u16(), excerpt(body)),
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}

/// Extract retry-after header value in seconds
fn extract_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
