//! CSV sink
//!
//! Append-only CSV file holding harvested records. The header goes out
//! before any row and every row is written and flushed as one unit, so a
//! reader never observes half a record even if the job dies mid-way.

use crate::error::{Error, Result};
use crate::types::Record;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column names, in row order
pub const HEADER: [&str; 7] = [
    "comment_id",
    "media_id",
    "username",
    "full_name",
    "comment_text",
    "created_at",
    "likes_count",
];

const LINE_END: &str = "\r\n";

/// Append-only CSV file of records
#[derive(Debug)]
pub struct CsvSink {
    file: File,
    path: PathBuf,
    rows_written: usize,
}

impl CsvSink {
    /// Create the file (and its directory) and write the header
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::output(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let file = File::create(&path).map_err(|e| {
            Error::output(format!("Failed to create {}: {e}", path.display()))
        })?;

        let mut sink = Self {
            file,
            path,
            rows_written: 0,
        };
        sink.write_line(&format_row(HEADER))?;
        debug!("Opened sink {}", sink.path.display());
        Ok(sink)
    }

    /// Append one record as a complete row
    pub fn append(&mut self, record: &Record) -> Result<()> {
        self.write_line(&record_row(record))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of data rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Location of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush to disk and release the file
    pub fn close(mut self) -> Result<usize> {
        self.file
            .flush()
            .and_then(|()| self.file.sync_data())
            .map_err(|e| Error::output(format!("Failed to close {}: {e}", self.path.display())))?;
        Ok(self.rows_written)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|e| Error::output(format!("Failed to write {}: {e}", self.path.display())))
    }
}

/// File name for a harvest: `{owner}_{shortcode}_comments_{YYYYMMDD_HHMMSS}.csv`
pub fn output_path<Tz>(
    dir: impl AsRef<Path>,
    owner: &str,
    shortcode: &str,
    started_at: &DateTime<Tz>,
) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let name = format!(
        "{}_{}_comments_{}.csv",
        sanitize_component(owner),
        sanitize_component(shortcode),
        started_at.format("%Y%m%d_%H%M%S")
    );
    dir.as_ref().join(name)
}

/// Keep file names portable
fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

fn record_row(record: &Record) -> String {
    let created_at = record.created_at_utc.to_string();
    let likes = record.like_count.to_string();
    format_row([
        record.id.as_str(),
        record.parent_resource_id.0.as_str(),
        record.author_handle.as_str(),
        record.author_display_name.as_str(),
        record.text.as_str(),
        created_at.as_str(),
        likes.as_str(),
    ])
}

fn format_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut row = fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",");
    row.push_str(LINE_END);
    row
}

/// Quote a field when it holds a delimiter, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
