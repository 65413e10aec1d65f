//! CLI arguments

use crate::engine::DEFAULT_LIMIT;
use clap::Parser;
use std::path::PathBuf;

/// Collect the comments of a post into a CSV file
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Post URL, e.g. https://www.instagram.com/p/<code>/
    #[arg(short, long)]
    pub url: Option<String>,

    /// Maximum number of comments to collect
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Session token to save for this and later runs
    #[arg(short, long)]
    pub session: Option<String>,

    /// Directory for result files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Credential store
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Configuration file (JSON)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Seconds to wait between pages
    #[arg(long)]
    pub delay: Option<f64>,

    /// Consecutive transient failures tolerated per page
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
