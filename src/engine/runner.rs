//! Engine runner.
//!
//! Owns the [`ReconciledState`] and drives the dispatch loop: locate the
//! journal, reconstruct it, then tail it while a rotation watcher looks for
//! newer journals in the background.

use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::dispatcher::EventDispatcher;
use super::state::{ReconciledState, StateSnapshot};
use crate::bots::{Notifier, NotifyError};
use crate::config::{AppConfig, NotifySettings, DEFAULT_ROTATION_INTERVAL_SECS};
use crate::journal::{
    decode_line, find_latest_journal, Baseline, JournalError, LiveTailer, RotationWatcher,
    StateReconstructor, TailControl, DEFAULT_POLL_INTERVAL,
};

/// Error type for engine operations.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// No journal directory configured and no default location available.
    #[error("Journal directory could not be determined")]
    NoJournalDir,
    /// Locating, reconstructing or tailing the journal failed.
    #[error(transparent)]
    Journal(#[from] JournalError),
    /// The notifier could not start.
    #[error("Notifier failed to start: {0}")]
    Notify(#[from] NotifyError),
}

/// The journal reconciliation and live-tail engine.
pub struct Engine {
    journal_dir: PathBuf,
    rotation_interval: Duration,
    poll_interval: Duration,
    notifier: Arc<dyn Notifier>,
    dispatcher: EventDispatcher,
    settings_rx: Option<watch::Receiver<NotifySettings>>,
    snapshot_tx: watch::Sender<StateSnapshot>,
    debug_lines: bool,
}

impl Engine {
    /// Create an engine for `journal_dir`.
    ///
    /// Events written before this call are applied to the state but never
    /// notified.
    #[must_use]
    pub fn new(
        journal_dir: PathBuf,
        notifier: Arc<dyn Notifier>,
        settings: NotifySettings,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(StateSnapshot::default());
        Self {
            journal_dir,
            rotation_interval: Duration::from_secs(DEFAULT_ROTATION_INTERVAL_SECS),
            poll_interval: DEFAULT_POLL_INTERVAL,
            notifier,
            dispatcher: EventDispatcher::new(settings),
            settings_rx: None,
            snapshot_tx,
            debug_lines: false,
        }
    }

    /// Create an engine from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoJournalDir`] if no journal directory is
    /// configured and the default location cannot be determined.
    pub fn from_config(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self, EngineError> {
        let journal_dir = config
            .journal
            .resolved_path()
            .ok_or(EngineError::NoJournalDir)?;
        Ok(Self::new(journal_dir, notifier, config.notify)
            .with_rotation_interval(config.journal.rotation_interval())
            .with_debug_lines(config.journal.debug))
    }

    /// Set the interval between rotation checks (builder pattern).
    #[must_use]
    pub fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = interval;
        self
    }

    /// Set the tailer's polling fallback interval (builder pattern).
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Follow live settings updates (builder pattern).
    #[must_use]
    pub fn with_settings_updates(mut self, settings_rx: watch::Receiver<NotifySettings>) -> Self {
        self.settings_rx = Some(settings_rx);
        self
    }

    /// Override the backlog boundary (builder pattern).
    #[must_use]
    pub fn with_process_start(mut self, process_start: DateTime<Utc>) -> Self {
        self.dispatcher =
            EventDispatcher::with_process_start(*self.dispatcher.settings(), process_start);
        self
    }

    /// Log every tailed line at debug level (builder pattern).
    #[must_use]
    pub fn with_debug_lines(mut self, debug_lines: bool) -> Self {
        self.debug_lines = debug_lines;
        self
    }

    /// Receive a copy of the state after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Returns the state as it stood when the engine stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if no journal can be located or read at startup, if
    /// the notifier fails to start, or if a journal cannot be opened for
    /// tailing.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<ReconciledState, EngineError> {
        let path = find_latest_journal(&self.journal_dir)?;
        tracing::info!(path = %path.display(), "Journal located");

        let mut current = StateReconstructor::reconstruct(&path).await?;
        self.publish(&current);

        self.notifier.start(shutdown.clone()).await?;

        let control = TailControl::new();
        let (baseline_tx, mut baseline_rx) = mpsc::channel(1);
        let rotation = RotationWatcher::new(
            self.journal_dir.clone(),
            path,
            self.rotation_interval,
            baseline_tx,
            control.clone(),
        );
        let rotation_shutdown = shutdown.child_token();
        let rotation_handle = tokio::spawn(rotation.run(rotation_shutdown.clone()));

        let result = self
            .dispatch_loop(&mut current, &control, &mut baseline_rx, &shutdown)
            .await;

        // Closing the receiver lets a pending handover finish
        drop(baseline_rx);
        rotation_shutdown.cancel();
        if let Err(e) = rotation_handle.await {
            tracing::warn!(error = %e, "Rotation watcher task failed");
        }

        result.map(|()| current.state)
    }

    async fn dispatch_loop(
        &mut self,
        current: &mut Baseline,
        control: &TailControl,
        baseline_rx: &mut mpsc::Receiver<Baseline>,
        shutdown: &CancellationToken,
    ) -> Result<(), EngineError> {
        loop {
            let stop = control.arm(shutdown);
            while let Ok(baseline) = baseline_rx.try_recv() {
                tracing::info!(path = %baseline.path.display(), "Switched to new journal");
                *current = baseline;
                self.publish(current);
            }

            let lines = LiveTailer::open(&current.path, current.offset, stop)
                .await?
                .with_poll_interval(self.poll_interval)
                .into_lines();
            let mut lines = pin!(lines);

            while let Some((line, offset)) = lines.next().await {
                current.offset = offset;
                self.handle_line(current, &line, shutdown).await;
            }

            if shutdown.is_cancelled() {
                tracing::debug!("Closing dispatch loop");
                return Ok(());
            }
        }
    }

    async fn handle_line(&mut self, current: &mut Baseline, line: &str, shutdown: &CancellationToken) {
        if self.debug_lines {
            tracing::debug!(line, "Journal line");
        }
        let Some(event) = decode_line(line) else {
            return;
        };

        if let Some(settings_rx) = &mut self.settings_rx {
            if settings_rx.has_changed().unwrap_or(false) {
                let settings = *settings_rx.borrow_and_update();
                self.dispatcher.set_settings(settings);
            }
        }

        let dispatch = self.dispatcher.dispatch(&mut current.state, &event);

        if dispatch.reconcile {
            match StateReconstructor::reconstruct_until(&current.path, Some(current.offset)).await {
                Ok(baseline) => current.state = baseline.state,
                Err(e) => {
                    tracing::warn!(error = %e, "Reconstruction failed, keeping incremental state");
                }
            }
        }

        self.publish(current);

        if let Some(text) = dispatch.notification {
            self.deliver(&text, shutdown).await;
        } else if dispatch.suppressed {
            tracing::debug!(kind = event.kind.name(), "Suppressed backlog notification");
        }
    }

    async fn deliver(&self, text: &str, shutdown: &CancellationToken) {
        tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                tracing::debug!("Dropping notification on shutdown");
            }
            result = self.notifier.send(text) => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Failed to send notification");
                }
            }
        }
    }

    fn publish(&self, current: &Baseline) {
        self.snapshot_tx
            .send_replace(current.state.snapshot(Some(&current.path)));
    }
}
