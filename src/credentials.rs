//! Credential store
//!
//! Persists the session token in a dotenv-style file under the
//! `session_id` key. Other lines in the file are left alone.

use crate::error::{Error, Result};
use crate::types::Session;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key the session token is stored under
pub const SESSION_KEY: &str = "session_id";

/// Default store location
pub const DEFAULT_ENV_FILE: &str = ".env";

/// File-backed session store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session
    ///
    /// A missing file or key is `Ok(None)`. A file that cannot be opened is
    /// an I/O error; one that cannot be parsed is a credentials error.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            debug!("No credential file at {}", self.path.display());
            return Ok(None);
        }

        // Open first so I/O failures surface as I/O errors, as documented
        File::open(&self.path)?;
        #[allow(deprecated)]
        let entries = dotenv::from_path_iter(&self.path)
            .map_err(|e| Error::credentials(&self.path, e.to_string()))?;
        for entry in entries {
            let (key, value) = entry.map_err(|e| Error::credentials(&self.path, e.to_string()))?;
            if key == SESSION_KEY {
                let session = Session::new(value);
                return Ok((!session.is_empty()).then_some(session));
            }
        }
        Ok(None)
    }

    /// Store a session, replacing any previous one
    pub async fn save(&self, session: &Session) -> Result<()> {
        let token = session.token();
        if token.is_empty() || token.contains(['\'', '\n', '\r']) {
            return Err(Error::invalid_input(
                "session token must be non-empty and contain no quotes or line breaks",
            ));
        }

        let existing = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::credentials(&self.path, e.to_string())),
        };
        let contents = upsert_session_line(&existing, token);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::credentials(&self.path, e.to_string()))?;
        }

        // Write to temp file first, then rename over the original
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(|e| Error::credentials(&temp_path, format!("write failed: {e}")))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::credentials(&self.path, format!("rename failed: {e}")))?;

        info!("Session saved to {}", self.path.display());
        Ok(())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_FILE)
    }
}

fn is_session_line(line: &str) -> bool {
    let line = line.trim_start();
    let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
    line.strip_prefix(SESSION_KEY)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

fn upsert_session_line(existing: &str, token: &str) -> String {
    let entry = format!("{SESSION_KEY}='{token}'");
    let mut replaced = false;
    let mut lines: Vec<String> = Vec::new();

    for line in existing.lines() {
        if is_session_line(line) {
            if !replaced {
                lines.push(entry.clone());
                replaced = true;
            }
        } else {
            lines.push(line.to_string());
        }
    }
    if !replaced {
        lines.push(entry);
    }

    let mut contents = lines.join("\n");
    contents.push('\n');
    contents
}
