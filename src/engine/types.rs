//! Engine types
//!
//! The job description, its state machine states, and the final report.

use crate::error::{Error, ErrorKind, Result};
use crate::resolve::{Locator, Resource};
use crate::types::Session;
use std::path::PathBuf;

/// Default number of comments collected per job
pub const DEFAULT_LIMIT: usize = 100;

/// The unit of work: one post, one limit, one session
#[derive(Debug, Clone)]
pub struct HarvestJob {
    pub locator: Locator,
    pub limit: usize,
    pub session: Session,
}

impl HarvestJob {
    /// Validate caller input; fails before any I/O
    pub fn new(locator: &str, limit: usize, session: Session) -> Result<Self> {
        if limit < 1 {
            return Err(Error::invalid_input("limit must be a positive number"));
        }
        let locator = Locator::parse(locator)?;
        Ok(Self {
            locator,
            limit,
            session,
        })
    }
}

/// Where the state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Resolving,
    Probing,
    FetchingPage,
    Draining,
    Throttling,
    Completed,
    LimitReached,
    Aborted,
}

impl From<JobStatus> for JobState {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Completed => Self::Completed,
            JobStatus::LimitReached => Self::LimitReached,
            JobStatus::Aborted => Self::Aborted,
        }
    }
}

/// Final status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// The resource ran out of records
    Completed,
    /// The caller's limit was reached
    LimitReached,
    /// Stopped by an error or cancellation; partial output is kept
    Aborted,
}

impl JobStatus {
    /// Completed and LimitReached both count as success
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Aborted)
    }

    /// Process exit code for this status
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Counters for one job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStats {
    /// Records appended to the sink
    pub records_written: usize,
    /// Successful page responses
    pub pages_fetched: u32,
    /// Transient failures retried
    pub retries: u32,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl JobStats {
    /// Add a record
    pub fn add_record(&mut self) {
        self.records_written += 1;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a retry
    pub fn add_retry(&mut self) {
        self.retries += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// What a job did, reported on every exit path
#[derive(Debug)]
pub struct HarvestReport {
    pub status: JobStatus,
    pub stats: JobStats,
    /// Limit the caller asked for
    pub requested_limit: usize,
    /// Limit after the declared total was applied
    pub effective_limit: usize,
    /// The resolved post, when resolution succeeded
    pub resource: Option<Resource>,
    /// Result file, when one was opened
    pub output_path: Option<PathBuf>,
    /// Why the job aborted
    pub error: Option<Error>,
}

impl HarvestReport {
    /// Records persisted by this job
    pub fn records_written(&self) -> usize {
        self.stats.records_written
    }

    /// Classification of the abort cause
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(Error::kind)
    }
}
