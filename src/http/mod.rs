//! HTTP transport module
//!
//! Provides the authenticated transport client and its request pacing.
//!
//! # Features
//!
//! - **Fixed device identity**: every call carries the same user agent
//! - **Session cookie**: the opaque session token rides on every call
//! - **Outcome classification**: status codes become typed errors, with no
//!   internal retries; retry policy belongs to the engine
//! - **Rate Limiting**: token bucket ceiling using governor

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
