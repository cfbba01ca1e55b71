//! Journal rotation watcher.
//!
//! The game starts a new journal file per session. This task re-runs the
//! locator on an interval and, when a newer journal appears, reconstructs
//! it and hands the resulting baseline to the dispatch task.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::discovery::find_latest_journal;
use super::reconstructor::{Baseline, StateReconstructor};
use super::tailer::TailControl;

/// Periodically relocates the newest journal.
#[derive(Debug)]
pub struct RotationWatcher {
    dir: PathBuf,
    current: PathBuf,
    interval: Duration,
    baseline_tx: mpsc::Sender<Baseline>,
    control: TailControl,
}

/// What a single rotation check did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationCheck {
    /// The newest journal is still the one being tailed.
    Unchanged,
    /// No journal could be located this time.
    Missing,
    /// The new journal could not be reconstructed; retried next tick.
    Failed(PathBuf),
    /// A new baseline was handed over.
    Rotated(PathBuf),
    /// The dispatch task is gone.
    Closed,
}

impl RotationWatcher {
    /// Create a watcher for `dir`, currently tailing `current`.
    #[must_use]
    pub fn new(
        dir: PathBuf,
        current: PathBuf,
        interval: Duration,
        baseline_tx: mpsc::Sender<Baseline>,
        control: TailControl,
    ) -> Self {
        Self {
            dir,
            current,
            interval,
            baseline_tx,
            control,
        }
    }

    #[must_use]
    pub fn current(&self) -> &Path {
        &self.current
    }

    /// Look for a newer journal once.
    pub async fn check(&mut self) -> RotationCheck {
        let latest = match find_latest_journal(&self.dir) {
            Ok(path) => path,
            Err(e) if e.is_transient() => {
                tracing::debug!(error = %e, "Journal not located, retrying later");
                return RotationCheck::Missing;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Journal lookup failed, retrying later");
                return RotationCheck::Missing;
            }
        };

        if latest == self.current {
            return RotationCheck::Unchanged;
        }

        tracing::info!(
            from = %self.current.display(),
            to = %latest.display(),
            "Journal rotated"
        );

        let baseline = match StateReconstructor::reconstruct(&latest).await {
            Ok(baseline) => baseline,
            Err(e) => {
                tracing::error!(path = %latest.display(), error = %e, "Failed to reconstruct new journal");
                return RotationCheck::Failed(latest);
            }
        };

        if self.baseline_tx.send(baseline).await.is_err() {
            return RotationCheck::Closed;
        }
        self.control.stop();
        self.current.clone_from(&latest);
        RotationCheck::Rotated(latest)
    }

    /// Check on every tick until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; startup already located the journal
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::debug!("Closing rotation watcher");
                    return;
                }
                _ = ticker.tick() => {
                    if self.check().await == RotationCheck::Closed {
                        tracing::debug!("Dispatch task gone, closing rotation watcher");
                        return;
                    }
                }
            }
        }
    }
}
