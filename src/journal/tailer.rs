//! Live journal tailer.
//!
//! Yields lines appended to a journal from a starting byte offset onward,
//! waking on filesystem events with a polling fallback.

use std::collections::VecDeque;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_core::Stream;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::JournalError;

/// Fallback interval for re-reading the journal when no filesystem event arrives.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Shared stop switch for whichever tailer is currently running.
///
/// The dispatch task arms a fresh token before opening each tailer; the
/// rotation watcher calls [`TailControl::stop`] after handing over a new
/// baseline.
#[derive(Debug, Clone, Default)]
pub struct TailControl {
    current: Arc<Mutex<CancellationToken>>,
}

impl TailControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new stop token, cancelled with `parent` or by [`Self::stop`].
    pub fn arm(&self, parent: &CancellationToken) -> CancellationToken {
        let token = parent.child_token();
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = token.clone();
        token
    }

    /// Ask the current tailer to finish.
    pub fn stop(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

/// Follows a journal file as the game appends to it.
///
/// Lines are yielded only once their terminating newline has been written;
/// a partially written line stays buffered until it completes.
#[derive(Debug)]
pub struct LiveTailer {
    path: PathBuf,
    file: File,
    /// End of the last line handed to the caller.
    offset: u64,
    /// Position up to which the file has been read.
    read_pos: u64,
    /// Start of the buffered partial line.
    partial_start: u64,
    partial: Vec<u8>,
    pending: VecDeque<(String, u64)>,
    stop: CancellationToken,
    poll: tokio::time::Interval,
    wake_rx: mpsc::Receiver<()>,
    // Keeps the channel open when no watcher could be installed
    _wake_tx: mpsc::Sender<()>,
    _watcher: Option<RecommendedWatcher>,
}

impl LiveTailer {
    /// Open `path` and start following it from byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Open`] if the file cannot be opened.
    pub async fn open(
        path: &Path,
        offset: u64,
        stop: CancellationToken,
    ) -> Result<Self, JournalError> {
        let file = File::open(path)
            .await
            .map_err(|source| JournalError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let (wake_tx, wake_rx) = mpsc::channel(1);
        let watcher = match watch_parent(path, wake_tx.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Filesystem watcher unavailable, falling back to polling"
                );
                None
            }
        };

        let mut poll = tokio::time::interval(DEFAULT_POLL_INTERVAL);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::debug!(path = %path.display(), offset, "Tailing journal");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            offset,
            read_pos: offset,
            partial_start: offset,
            partial: Vec::new(),
            pending: VecDeque::new(),
            stop,
            poll,
            wake_rx,
            _wake_tx: wake_tx,
            _watcher: watcher,
        })
    }

    /// Set the polling fallback interval (builder pattern).
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll = tokio::time::interval(interval);
        self.poll
            .set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset just past the last yielded line.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Wait for the next complete line.
    ///
    /// Returns `None` once the stop token is cancelled. Read errors are
    /// logged and retried on the next wakeup.
    pub async fn next_line(&mut self) -> Option<String> {
        loop {
            if self.stop.is_cancelled() {
                return None;
            }

            if let Some((line, end)) = self.pending.pop_front() {
                self.offset = end;
                return Some(line);
            }

            if let Err(e) = self.read_available().await {
                tracing::warn!(path = %self.path.display(), error = %e, "Journal read failed");
            }
            if !self.pending.is_empty() {
                continue;
            }

            tokio::select! {
                biased;

                () = self.stop.cancelled() => return None,
                _ = self.wake_rx.recv() => {}
                _ = self.poll.tick() => {}
            }
        }
    }

    /// Turn the tailer into a stream that ends on stop.
    ///
    /// Each item carries the byte offset just past the line, which is where
    /// a new tailer must resume.
    pub fn into_lines(self) -> impl Stream<Item = (String, u64)> {
        futures_util::stream::unfold(self, |mut tailer| async move {
            let line = tailer.next_line().await?;
            let offset = tailer.offset();
            Some(((line, offset), tailer))
        })
    }

    async fn read_available(&mut self) -> Result<(), JournalError> {
        let read_error = |source: std::io::Error| JournalError::Read {
            path: self.path.clone(),
            source,
        };

        let len = self.file.metadata().await.map_err(read_error)?.len();

        if len < self.read_pos {
            tracing::warn!(
                path = %self.path.display(),
                old_offset = self.read_pos,
                new_len = len,
                "Journal truncated, resetting offset to 0"
            );
            self.offset = 0;
            self.read_pos = 0;
            self.partial_start = 0;
            self.partial.clear();
            self.pending.clear();
        }

        if len == self.read_pos {
            return Ok(());
        }

        self.file
            .seek(SeekFrom::Start(self.read_pos))
            .await
            .map_err(read_error)?;

        let mut chunk = Vec::new();
        let read = (&mut self.file)
            .take(len - self.read_pos)
            .read_to_end(&mut chunk)
            .await
            .map_err(read_error)?;
        self.read_pos += read as u64;
        self.partial.extend_from_slice(&chunk);

        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            self.partial_start += raw.len() as u64;
            let line = String::from_utf8_lossy(&raw)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            self.pending.push_back((line, self.partial_start));
        }

        Ok(())
    }
}

/// Watch the journal's directory and signal `wake_tx` on any change.
fn watch_parent(path: &Path, wake_tx: mpsc::Sender<()>) -> Result<RecommendedWatcher, JournalError> {
    let mut watcher = notify::recommended_watcher(move |_: notify::Result<notify::Event>| {
        let _ = wake_tx.try_send(());
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
