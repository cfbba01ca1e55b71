//! Journal error types.

use std::path::PathBuf;

/// Errors that can occur while locating, reading or tailing journals.
#[derive(thiserror::Error, Debug)]
pub enum JournalError {
    /// No journal file matches the naming convention in the directory.
    #[error("No journal file found in {0}")]
    NotFound(PathBuf),

    /// The located journal could not be opened.
    #[error("Cannot open journal {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the journal failed mid-scan.
    #[error("Cannot read journal {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file system watcher for the journal directory failed.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}

impl JournalError {
    /// Whether a rotation poll should simply retry on the next tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
