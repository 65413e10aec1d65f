//! Harvest engine module
//!
//! Drives one job through resolution, session probing, and the page loop.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Harvester` - Runs a `HarvestJob` to a `HarvestReport`
//! - `RateController` - Baseline pacing and failure backoff
//! - Job, state, and status types
//!
//! # Example
//!
//! ```ignore
//! use comment_harvest::engine::{HarvestJob, Harvester};
//! use comment_harvest::{HarvestConfig, Session};
//!
//! let job = HarvestJob::new("https://www.instagram.com/p/ABC123/", 100, Session::new("token"))?;
//! let report = Harvester::new(HarvestConfig::default()).run(job).await;
//! println!("{:?}: {} comments", report.status, report.records_written());
//! ```

mod throttle;
mod types;

pub use throttle::{PageOutcome, RateController};
pub use types::{HarvestJob, HarvestReport, JobState, JobStats, JobStatus, DEFAULT_LIMIT};

use crate::config::HarvestConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::output::{output_path, CsvSink};
use crate::pagination::{CommentsPage, Cursor, NextPage};
use crate::progress::{NoopReporter, ProgressEvent, ProgressReporter};
use crate::resolve::{Resource, ResourceResolver};
use crate::types::UNKNOWN_OWNER;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs harvest jobs
pub struct Harvester {
    /// Harvest configuration
    config: HarvestConfig,
    /// Progress observer
    reporter: Arc<dyn ProgressReporter>,
    /// Cooperative stop signal
    cancel: CancellationToken,
}

impl Harvester {
    /// Create a harvester with no progress observer
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(NoopReporter),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the progress observer
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the running job at its next suspension point
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the configuration
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Run a job to completion
    ///
    /// Never fails: every exit path yields a report, and a sink that was
    /// opened is closed with all appended rows durable.
    pub async fn run(&self, job: HarvestJob) -> HarvestReport {
        let start = Instant::now();
        info!(
            "Harvesting up to {} comments from {}",
            job.limit, job.locator
        );

        let mut run = JobRun::new(self, job.limit);
        run.transition(JobState::Idle);
        let outcome = run.drive(&job).await;
        let closed = run.close_sink();

        let (status, error) = match (outcome, closed) {
            (Ok(status), Ok(())) => (status, None),
            (Ok(_), Err(e)) => (JobStatus::Aborted, Some(e)),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    error!("Failed to close output: {close_err}");
                }
                (JobStatus::Aborted, Some(e))
            }
        };

        run.stats.set_duration(start.elapsed().as_millis() as u64);
        run.transition(status.into());
        self.reporter.report(&ProgressEvent::Finished {
            status,
            records_written: run.stats.records_written,
        });

        match &error {
            None => info!(
                "Harvest {:?}: {} comments over {} pages in {}ms",
                status, run.stats.records_written, run.stats.pages_fetched, run.stats.duration_ms
            ),
            Some(e) => warn!(
                "Harvest aborted after {} comments: {e}",
                run.stats.records_written
            ),
        }

        HarvestReport {
            status,
            stats: run.stats,
            requested_limit: job.limit,
            effective_limit: run.effective_limit,
            resource: run.resource,
            output_path: run.output_path,
            error,
        }
    }
}

/// Mutable state of one job; never shared between jobs
struct JobRun<'h> {
    harvester: &'h Harvester,
    started_at: DateTime<Local>,
    stats: JobStats,
    effective_limit: usize,
    resource: Option<Resource>,
    sink: Option<CsvSink>,
    output_path: Option<PathBuf>,
}

impl<'h> JobRun<'h> {
    fn new(harvester: &'h Harvester, limit: usize) -> Self {
        Self {
            harvester,
            started_at: Local::now(),
            stats: JobStats::default(),
            effective_limit: limit,
            resource: None,
            sink: None,
            output_path: None,
        }
    }

    fn report(&self, event: ProgressEvent) {
        self.harvester.reporter.report(&event);
    }

    fn transition(&self, state: JobState) {
        debug!("Entering {state:?}");
        self.report(ProgressEvent::StateChanged(state));
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.harvester.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    async fn drive(&mut self, job: &HarvestJob) -> Result<JobStatus> {
        let harvester = self.harvester;
        let config = &harvester.config;

        self.check_cancelled()?;
        self.transition(JobState::Resolving);
        let client = HttpClient::new(config.http_client_config(), job.session.clone())?;
        let resource = ResourceResolver::new(&client).resolve(&job.locator).await?;
        self.report(ProgressEvent::Resolved {
            media_id: resource.media_id.clone(),
        });
        let comments_path = format!("media/{}/comments/", resource.media_id);
        let media_id = resource.media_id.clone();
        self.resource = Some(resource);

        self.check_cancelled()?;
        self.transition(JobState::Probing);
        if !client.validate_session().await? {
            return Err(Error::unauthorized(
                "session was rejected; supply a fresh session token",
            ));
        }

        let mut controller = RateController::new(&config.pacing);
        let mut cursor = Cursor::initial();

        loop {
            self.check_cancelled()?;
            self.transition(JobState::FetchingPage);

            let page = match self.fetch_page(&client, &comments_path, &cursor).await {
                Ok(page) => page,
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    let delay = controller.next_delay(&PageOutcome::from_error(&e));
                    let attempt = controller.attempts();
                    if attempt > config.pacing.max_retries {
                        return Err(Error::RetriesExhausted {
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }

                    self.stats.add_retry();
                    debug!("Page request failed ({e}); retry {attempt} in {delay:?}");
                    self.report(ProgressEvent::Retrying {
                        attempt,
                        reason: e.kind(),
                        delay,
                    });
                    self.transition(JobState::Throttling);
                    controller
                        .wait(delay, &harvester.cancel, harvester.reporter.as_ref())
                        .await?;
                    continue;
                }
            };

            let baseline = controller.next_delay(&PageOutcome::Success);
            self.stats.add_page();
            let page_no = self.stats.pages_fetched;
            self.report(ProgressEvent::PageFetched {
                page: page_no,
                records: page.comments.len(),
            });

            if self.sink.is_none() {
                self.open_sink(job, &page)?;
            }

            self.transition(JobState::Draining);
            let next = page.next_page(&cursor);
            let limit = self.effective_limit;
            let sink = self
                .sink
                .as_mut()
                .ok_or_else(|| Error::output("result file is not open"))?;

            for raw in page.comments {
                if self.stats.records_written >= limit {
                    break;
                }
                sink.append(&raw.into_record(&media_id))?;
                self.stats.add_record();
                harvester.reporter.report(&ProgressEvent::RecordWritten {
                    page: page_no,
                    written: self.stats.records_written,
                    limit,
                });
            }

            if self.stats.records_written >= limit {
                return Ok(if limit < job.limit {
                    JobStatus::Completed
                } else {
                    JobStatus::LimitReached
                });
            }

            match next {
                NextPage::Done => return Ok(JobStatus::Completed),
                NextPage::Continue(next_cursor) => {
                    self.transition(JobState::Throttling);
                    controller
                        .wait(baseline, &harvester.cancel, harvester.reporter.as_ref())
                        .await?;
                    cursor = next_cursor;
                }
            }
        }
    }

    async fn fetch_page(
        &self,
        client: &HttpClient,
        path: &str,
        cursor: &Cursor,
    ) -> Result<CommentsPage> {
        let request = cursor.apply(
            RequestConfig::new()
                .query("can_support_threading", "true")
                .query("permalink_enabled", "false")
                .query(
                    "count",
                    self.harvester.config.api.page_size_hint.to_string(),
                ),
        );

        let body = tokio::select! {
            biased;
            () = self.harvester.cancel.cancelled() => return Err(Error::Cancelled),
            body = client.request(path, request) => body?,
        };
        CommentsPage::from_value(body)
    }

    /// Apply the declared total and create the result file
    fn open_sink(&mut self, job: &HarvestJob, page: &CommentsPage) -> Result<()> {
        let owner = page.owner().unwrap_or(UNKNOWN_OWNER).to_string();

        if let Some(total) = page.comment_count {
            let total_limit = usize::try_from(total).unwrap_or(usize::MAX);
            if total_limit < job.limit {
                self.effective_limit = total_limit;
                self.report(ProgressEvent::EffectiveLimit {
                    requested: job.limit,
                    declared_total: total,
                    effective: total_limit,
                });
            }
        }

        let path = output_path(
            &self.harvester.config.output.results_dir,
            &owner,
            job.locator.shortcode(),
            &self.started_at,
        );
        let sink = CsvSink::create(&path)?;

        if let Some(resource) = self.resource.as_mut() {
            resource.owner = owner;
        }
        self.report(ProgressEvent::SinkOpened { path: path.clone() });
        self.output_path = Some(path);
        self.sink = Some(sink);
        Ok(())
    }

    fn close_sink(&mut self) -> Result<()> {
        match self.sink.take() {
            Some(sink) => sink.close().map(|rows| {
                debug!("Closed output with {rows} rows");
            }),
            None => Ok(()),
        }
    }
}
