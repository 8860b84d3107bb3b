//! Error types for ledger operations.
//!
//! Only write-side failures and malformed external input surface here. Read
//! failures of the history, snapshot and quarantine files degrade to empty
//! defaults inside the store and never become a [`LedgerError`].

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Persisting a file failed (disk full, permission denied, ...).
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Externally supplied results or comparison JSON is unreadable or malformed.
    #[error("invalid input {}: {detail}", path.display())]
    InvalidInput { path: PathBuf, detail: String },

    #[error("invalid config {}: {detail}", path.display())]
    Config { path: PathBuf, detail: String },
}

impl LedgerError {
    pub fn write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn serialize(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Serialize {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn invalid_input(path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }

    pub fn config(path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        Self::Config {
            path: path.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }
}

/// Serializes `value` as pretty JSON and overwrites `path`, creating parent dirs.
pub(crate) fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> LedgerResult<()> {
    let body = serde_json::to_string_pretty(value).map_err(|e| LedgerError::serialize(path, e))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| LedgerError::write(path, e))?;
        }
    }
    std::fs::write(path, body).map_err(|e| LedgerError::write(path, e))
}
