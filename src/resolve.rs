//! Resource resolution
//!
//! Turns a public post URL into the internal media identifier the comments
//! API is keyed on. The identifier is only rendered inline in the post's own
//! page, so resolution costs exactly one round trip.

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::types::{MediaId, UNKNOWN_OWNER};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

static POST_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/p/([A-Za-z0-9_-]+)/?$").expect("valid post path regex"));

static INLINE_MEDIA_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""media_id":"(\d+)""#).expect("valid media id regex"));

/// A validated post locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    url: Url,
    shortcode: String,
}

impl Locator {
    /// Validate a post URL
    ///
    /// Accepts `http(s)://<host>/p/<shortcode>[/]`, ignoring query and fragment.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| Error::invalid_input(format!("'{input}' is not a URL: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::invalid_input(format!(
                "'{input}' must be an http(s) URL with a host"
            )));
        }

        let shortcode = POST_PATH
            .captures(url.path())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                Error::invalid_input(format!("'{input}' is not a post URL (expected /p/<code>/)"))
            })?;

        Ok(Self { url, shortcode })
    }

    /// The post URL as given
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Short code from the URL path
    pub fn shortcode(&self) -> &str {
        &self.shortcode
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// A resolved post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub locator: Locator,
    pub media_id: MediaId,
    /// Owner handle, best effort
    pub owner: String,
}

impl Resource {
    /// A resource whose owner is not known yet
    pub fn new(locator: Locator, media_id: MediaId) -> Self {
        Self {
            locator,
            media_id,
            owner: UNKNOWN_OWNER.to_string(),
        }
    }
}

/// Resolves locators to media identifiers
pub struct ResourceResolver<'a> {
    client: &'a HttpClient,
}

impl<'a> ResourceResolver<'a> {
    /// Create a resolver on top of a transport client
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    /// Fetch the post page and extract its media identifier
    pub async fn resolve(&self, locator: &Locator) -> Result<Resource> {
        debug!("Resolving media id for {locator}");
        let body = self.client.fetch_text(locator.url().as_str()).await?;

        let media_id = extract_media_id(&body).ok_or_else(|| {
            Error::not_found(format!("no media id found in the page for {locator}"))
        })?;

        info!("Resolved {} to media id {}", locator.shortcode(), media_id);
        Ok(Resource::new(locator.clone(), media_id))
    }
}

/// Find the inline `"media_id":"<digits>"` token in a page body
pub fn extract_media_id(body: &str) -> Option<MediaId> {
    INLINE_MEDIA_ID
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| MediaId(m.as_str().to_string()))
}
