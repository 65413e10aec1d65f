//! CLI runner - executes a harvest from parsed arguments

use crate::cli::commands::Cli;
use crate::config::HarvestConfig;
use crate::credentials::CredentialStore;
use crate::engine::{HarvestJob, HarvestReport, Harvester};
use crate::error::{Error, Result, ResultExt};
use crate::progress::TracingReporter;
use crate::types::Session;
use clap::CommandFactory;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI and return the process exit code
    ///
    /// Errors are configuration or input problems found before harvesting
    /// starts; the caller maps them to exit code 1.
    pub async fn run(&self) -> Result<i32> {
        let store = CredentialStore::new(&self.cli.env_file);

        if let Some(token) = &self.cli.session {
            store.save(&Session::new(token.as_str())).await?;
            println!("Session saved to {}", store.path().display());
            if self.cli.url.is_none() {
                return Ok(0);
            }
        }

        let Some(url) = &self.cli.url else {
            Cli::command()
                .print_help()
                .context("Failed to print help")?;
            return Ok(0);
        };

        let session = self.session(&store)?;
        let job = HarvestJob::new(url, self.cli.limit, session)?;
        let config = self.config()?;

        let harvester = Harvester::new(config).with_reporter(Arc::new(TracingReporter));
        let cancel = harvester.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; stopping after the current step");
                cancel.cancel();
            }
        });

        let report = harvester.run(job).await;
        print_summary(&report);
        Ok(report.status.exit_code())
    }

    /// Session from the flag, else from the store
    fn session(&self, store: &CredentialStore) -> Result<Session> {
        if let Some(token) = &self.cli.session {
            return Ok(Session::new(token.as_str()));
        }
        store.load()?.ok_or_else(|| {
            Error::config(format!(
                "No session found in {}; pass one with --session",
                store.path().display()
            ))
        })
    }

    /// Config file (if any) with command-line overrides applied
    fn config(&self) -> Result<HarvestConfig> {
        let mut config = match &self.cli.config {
            Some(path) => {
                info!("Loading config from {}", path.display());
                HarvestConfig::from_file(path)?
            }
            None => HarvestConfig::default(),
        };

        if let Some(dir) = &self.cli.output_dir {
            config = config.with_results_dir(dir);
        }
        if let Some(secs) = self.cli.delay {
            if !secs.is_finite() || secs < 0.0 {
                return Err(Error::invalid_input("--delay must be a non-negative number"));
            }
            config = config.with_page_delay(Duration::from_secs_f64(secs));
        }
        if let Some(retries) = self.cli.max_retries {
            config = config.with_max_retries(retries);
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_summary(report: &HarvestReport) {
    println!();
    println!("Status:   {:?}", report.status);
    println!(
        "Comments: {} (limit {})",
        report.records_written(),
        report.effective_limit
    );
    println!(
        "Pages:    {} ({} retries)",
        report.stats.pages_fetched, report.stats.retries
    );
    match &report.output_path {
        Some(path) => println!("Output:   {}", path.display()),
        None => println!("Output:   no file"),
    }
    if let Some(error) = &report.error {
        println!("Error:    {error}");
    }
}
