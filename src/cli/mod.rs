//! CLI module
//!
//! Command-line interface for harvesting comments.
//!
//! # Usage
//!
//! - `harvest -s <token>` - Save a session token and exit
//! - `harvest -u <post url> [-l N]` - Harvest up to N comments into a CSV file
//! - `harvest` - Print help

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::Runner;
