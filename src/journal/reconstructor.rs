//! Journal state reconstructor.
//!
//! Folds a whole journal into a fresh [`ReconciledState`] using the same
//! per-kind rules as live dispatch, without producing notifications.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use super::error::JournalError;
use super::event::{decode_line, JournalEvent};
use crate::config::NotifySettings;
use crate::engine::{handlers, ReconciledState};

/// State derived from a journal, plus where the derivation stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    /// Journal the state was derived from.
    pub path: PathBuf,
    /// The reconciled state.
    pub state: ReconciledState,
    /// Byte offset just past the last complete line folded in.
    pub offset: u64,
}

/// Reconstructs state from journal lines.
///
/// Mission lifecycle events older than the last missions snapshot are
/// skipped, since the snapshot already accounts for them.
#[derive(Debug, Default)]
pub struct StateReconstructor {
    state: ReconciledState,
    applied: usize,
    skipped_stale: usize,
}

impl StateReconstructor {
    /// Create a new reconstructor with a zeroed state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a raw journal line.
    ///
    /// Blank, malformed and unrecognised lines are logged and ignored.
    pub fn process_line(&mut self, line: &str) {
        if let Some(event) = decode_line(line) {
            self.process_event(&event);
        }
    }

    /// Process a decoded event.
    pub fn process_event(&mut self, event: &JournalEvent) {
        if event.is_mission_lifecycle() && self.state.is_stale(event.timestamp) {
            tracing::trace!(
                kind = event.kind.name(),
                timestamp = %event.timestamp,
                "Skipping mission event older than the missions snapshot"
            );
            self.skipped_stale += 1;
            return;
        }

        // Notifications are discarded, so the settings never matter here
        handlers::apply(&mut self.state, event, &NotifySettings::default());
        self.applied += 1;
    }

    /// Process multiple lines in order.
    pub fn process_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.process_line(line);
        }
    }

    #[must_use]
    pub fn state(&self) -> &ReconciledState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> ReconciledState {
        self.state
    }

    /// Number of events folded into the state.
    #[must_use]
    pub fn applied_events(&self) -> usize {
        self.applied
    }

    /// Number of mission events dropped by the snapshot watermark.
    #[must_use]
    pub fn skipped_stale(&self) -> usize {
        self.skipped_stale
    }

    /// Reconstruct state from the whole journal.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Open`] if the file cannot be opened and
    /// [`JournalError::Read`] if reading fails mid-scan.
    pub async fn reconstruct(path: &Path) -> Result<Baseline, JournalError> {
        Self::reconstruct_until(path, None).await
    }

    /// Reconstruct state from the first `limit` bytes of the journal.
    ///
    /// A trailing line without a newline is still being written and is left
    /// for the tailer; the returned offset stops before it.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Open`] if the file cannot be opened and
    /// [`JournalError::Read`] if reading fails mid-scan.
    pub async fn reconstruct_until(
        path: &Path,
        limit: Option<u64>,
    ) -> Result<Baseline, JournalError> {
        let file = File::open(path)
            .await
            .map_err(|source| JournalError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut reader = BufReader::new(file.take(limit.unwrap_or(u64::MAX)));
        let mut reconstructor = Self::new();
        let mut offset = 0u64;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let bytes_read =
                reader
                    .read_until(b'\n', &mut buf)
                    .await
                    .map_err(|source| JournalError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;

            if bytes_read == 0 || buf.last() != Some(&b'\n') {
                break;
            }

            offset += bytes_read as u64;
            reconstructor.process_line(&String::from_utf8_lossy(&buf));
        }

        let state = reconstructor.state();
        tracing::info!(
            path = %path.display(),
            active_missions = state.active_missions,
            killed_pirates = state.killed_pirates,
            pirate_reward = state.total_pirate_reward,
            mission_reward = state.total_mission_reward,
            skipped_stale = reconstructor.skipped_stale(),
            "Journal reconstructed"
        );

        Ok(Baseline {
            path: path.to_path_buf(),
            state: reconstructor.into_state(),
            offset,
        })
    }
}
