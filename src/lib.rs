// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # comment-harvest
//!
//! Collects the comments of a single social-media post into a CSV file,
//! page by page, pacing itself so the remote service does not throttle or
//! flag the session.
//!
//! ## Features
//!
//! - **Post resolution**: public post URL to internal media id
//! - **Session probe**: rejected sessions fail before any file is created
//! - **Cursor pagination**: forward/backward tokens with a hard limit
//! - **Adaptive pacing**: baseline delay, escalating backoff on throttling
//! - **Incremental output**: every comment is flushed to disk as it arrives
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use comment_harvest::engine::{HarvestJob, Harvester};
//! use comment_harvest::{HarvestConfig, Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let job = HarvestJob::new(
//!         "https://www.instagram.com/p/ABC123/",
//!         100,
//!         Session::new("session-token"),
//!     )?;
//!
//!     let report = Harvester::new(HarvestConfig::default()).run(job).await;
//!     println!("{:?}: {} comments", report.status, report.records_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Harvester                           │
//! │  Resolving → Probing → FetchingPage → Draining → Throttling  │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────┬───┴─────────┬─────────────┬────────┐
//! │ Credential │    HTTP     │  Paginate   │  Throttle   │ Output │
//! ├────────────┼─────────────┼─────────────┼─────────────┼────────┤
//! │ .env store │ Session     │ min_id      │ Baseline    │ CSV    │
//! │            │ Classify    │ max_id      │ Backoff     │ Flush  │
//! │            │ Rate Limit  │ Limit       │ Countdown   │        │
//! └────────────┴─────────────┴─────────────┴─────────────┴────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Harvest configuration
pub mod config;

/// Session persistence
pub mod credentials;

/// HTTP transport with session auth and rate limiting
pub mod http;

/// Post URL to media id resolution
pub mod resolve;

/// Comment page decoding and cursor continuation
pub mod pagination;

/// CSV output
pub mod output;

/// Progress events
pub mod progress;

/// Harvest state machine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::HarvestConfig;
pub use engine::{HarvestJob, HarvestReport, Harvester, JobStatus};
pub use error::{Error, ErrorKind, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
