//! Common types used throughout comment-harvest
//!
//! This module contains shared type definitions used across the
//! transport, engine and output layers.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Session
// ============================================================================

/// Opaque session credential
///
/// Immutable for the duration of a job. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    /// Wrap a raw session token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    /// The raw token value
    pub fn token(&self) -> &str {
        &self.0
    }

    /// An empty token can never be valid
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Session").field(&"<redacted>").finish()
    }
}

// ============================================================================
// Resource
// ============================================================================

/// Internal numeric identifier of a post
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(pub String);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner name used when the post metadata does not carry one
pub const UNKNOWN_OWNER: &str = "unknown";

// ============================================================================
// Record
// ============================================================================

/// One harvested comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub parent_resource_id: MediaId,
    pub author_handle: String,
    pub author_display_name: String,
    pub text: String,
    /// Epoch seconds
    pub created_at_utc: i64,
    pub like_count: u64,
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}
