//! Error types for comment-harvest
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for comment-harvest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Input & Configuration Errors
    // ============================================================================
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Credential store error at {path}: {message}")]
    Credentials { path: PathBuf, message: String },

    // ============================================================================
    // Remote Errors
    // ============================================================================
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Rate limited, retry after {retry_after_seconds:?}s")]
    RateLimited { retry_after_seconds: Option<u64> },

    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Gave up after {attempts} consecutive failed attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Harvest cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used for reporting and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    RateLimited,
    ServerError,
    NetworkError,
    NotFound,
    MalformedResponse,
    Cancelled,
    Fatal,
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a credential store error
    pub fn credentials(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Credentials {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput { .. } => ErrorKind::InvalidInput,
            Error::Unauthorized { .. } => ErrorKind::Unauthorized,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::ServerError { .. } => ErrorKind::ServerError,
            Error::Network(_) => ErrorKind::NetworkError,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Error::RetriesExhausted { source, .. } => source.kind(),
            Error::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Fatal,
        }
    }

    /// Check if this error is retryable
    ///
    /// Only transient remote conditions qualify; everything else goes
    /// straight to the job boundary.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RateLimited { .. } | Error::ServerError { .. } | Error::Network(_)
        )
    }
}

/// Result type alias for comment-harvest
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_input("limit must be at least 1");
        assert_eq!(err.to_string(), "Invalid input: limit must be at least 1");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::RetriesExhausted {
            attempts: 3,
            source: Box::new(Error::ServerError { status: 502 }),
        };
        assert_eq!(
            err.to_string(),
            "Gave up after 3 consecutive failed attempts: Server error: HTTP 502"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: Some(60)
        }
        .is_retryable());
        assert!(Error::ServerError { status: 503 }.is_retryable());

        assert!(!Error::unauthorized("expired").is_retryable());
        assert!(!Error::not_found("media_id").is_retryable());
        assert!(!Error::malformed("missing comments").is_retryable());
        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_kind_follows_exhausted_source() {
        let err = Error::RetriesExhausted {
            attempts: 5,
            source: Box::new(Error::RateLimited {
                retry_after_seconds: None,
            }),
        };
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(Error::config("x").kind(), ErrorKind::Fatal);
        assert_eq!(Error::invalid_input("x").kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }

    #[test]
    fn test_io_errors_convert_with_context() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stdout closed",
        ));
        let err = io.context("Failed to print help").unwrap_err();
        assert_eq!(err.to_string(), "Failed to print help: IO error: stdout closed");

        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Fatal);
        assert!(!err.is_retryable());
    }
}
