//! Progress reporting
//!
//! The engine publishes [`ProgressEvent`]s to a [`ProgressReporter`] as it
//! works. Reporters observe only; nothing they do feeds back into control
//! flow.

use crate::engine::{JobState, JobStatus};
use crate::error::ErrorKind;
use crate::types::MediaId;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Something worth telling an observer about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The state machine moved
    StateChanged(JobState),
    /// The locator resolved to an internal id
    Resolved { media_id: MediaId },
    /// The declared total shrank the caller's limit
    EffectiveLimit {
        requested: usize,
        declared_total: u64,
        effective: usize,
    },
    /// The sink file exists and holds its header
    SinkOpened { path: PathBuf },
    /// A page came back
    PageFetched { page: u32, records: usize },
    /// A record reached the sink
    RecordWritten {
        page: u32,
        written: usize,
        limit: usize,
    },
    /// A transient failure will be retried on the same cursor
    Retrying {
        attempt: u32,
        reason: ErrorKind,
        delay: Duration,
    },
    /// Countdown tick during an inter-page delay
    Waiting { remaining: Duration },
    /// The job reached a final status
    Finished {
        status: JobStatus,
        records_written: usize,
    },
}

/// Observer of harvest progress
pub trait ProgressReporter: Send + Sync {
    /// Handle one event
    fn report(&self, event: &ProgressEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::StateChanged(state) => debug!("State: {state:?}"),
            ProgressEvent::Resolved { media_id } => debug!("Media id: {media_id}"),
            ProgressEvent::EffectiveLimit {
                requested,
                declared_total,
                effective,
            } => info!(
                "Post declares {declared_total} comments; collecting {effective} instead of {requested}"
            ),
            ProgressEvent::SinkOpened { path } => info!("Writing to {}", path.display()),
            ProgressEvent::PageFetched { page, records } => {
                info!("Page {page}: {records} comments received");
            }
            ProgressEvent::RecordWritten {
                page,
                written,
                limit,
            } => debug!("Page {page}, comments {written}/{limit}"),
            ProgressEvent::Retrying {
                attempt,
                reason,
                delay,
            } => warn!("{reason:?} on attempt {attempt}, retrying in {delay:?}"),
            ProgressEvent::Waiting { remaining } => {
                debug!("Fetching next page in {:.1}s", remaining.as_secs_f64());
            }
            ProgressEvent::Finished {
                status,
                records_written,
            } => info!("Finished {status:?} with {records_written} comments"),
        }
    }
}
