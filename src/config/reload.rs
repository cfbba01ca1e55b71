//! Live reload of notification settings.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::{ConfigLoader, NotifySettings};

/// Default interval between fallback checks of the config file's mtime.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(5);

/// Watches the config file and republishes [`NotifySettings`] when it changes.
///
/// File system events trigger a reload directly. The mtime poll only covers
/// platforms or mounts where the watcher cannot be installed.
///
/// Only the notify switches are reloaded; everything else requires a restart.
pub struct SettingsWatcher {
    path: PathBuf,
    interval: Duration,
    last_modified: Option<SystemTime>,
    tx: watch::Sender<NotifySettings>,
    wake_rx: mpsc::Receiver<()>,
    // Keeps `wake_rx` open when the watcher could not be created
    _wake_tx: mpsc::Sender<()>,
    _watcher: Option<RecommendedWatcher>,
}

impl SettingsWatcher {
    /// Create a watcher for `path` seeded with the settings already loaded.
    ///
    /// The file system watcher is installed immediately, so edits made after
    /// this call are seen even before [`run`](Self::run) is polled.
    ///
    /// Returns the watcher and a receiver that always holds the latest
    /// settings.
    #[must_use]
    pub fn new(path: PathBuf, initial: NotifySettings) -> (Self, watch::Receiver<NotifySettings>) {
        let (tx, rx) = watch::channel(initial);
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let watcher = match watch_config(&path, wake_tx.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Config watcher unavailable, falling back to polling"
                );
                None
            }
        };
        let last_modified = modified(&path);
        (
            Self {
                path,
                interval: DEFAULT_RELOAD_INTERVAL,
                last_modified,
                tx,
                wake_rx,
                _wake_tx: wake_tx,
                _watcher: watcher,
            },
            rx,
        )
    }

    /// Set the fallback polling interval (builder pattern).
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Reload the settings if the file's mtime moved since the last check.
    ///
    /// Returns `true` when new settings were published.
    pub fn check(&mut self) -> bool {
        let current = modified(&self.path);
        if current.is_none() || current == self.last_modified {
            return false;
        }
        self.reload()
    }

    /// Re-read the file and publish the settings if they differ.
    ///
    /// Returns `true` when new settings were published. Parse errors are
    /// logged and the previous settings stay in effect.
    pub fn reload(&mut self) -> bool {
        self.last_modified = modified(&self.path);

        match ConfigLoader::load_from_path(&self.path) {
            Ok(config) => {
                if config.notify == *self.tx.borrow() {
                    return false;
                }
                tracing::info!(
                    fighter = config.notify.fighter,
                    shields = config.notify.shields,
                    kills = config.notify.kills,
                    silent_kills = config.notify.silent_kills,
                    "Notification settings reloaded"
                );
                self.tx.send_replace(config.notify);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid config change");
                false
            }
        }
    }

    /// Follow the config file until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::debug!("Closing settings watcher");
                    return;
                }
                _ = self.wake_rx.recv() => {
                    self.reload();
                }
                _ = ticker.tick() => {
                    self.check();
                }
            }
        }
    }
}

/// Watch the config file's directory, waking only for events on the file.
///
/// Editors often replace the file rather than write it in place, so the
/// directory is watched instead of the file itself.
fn watch_config(path: &Path, wake_tx: mpsc::Sender<()>) -> notify::Result<RecommendedWatcher> {
    let name: Option<OsString> = path.file_name().map(OsString::from);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        let touches_config = event
            .paths
            .iter()
            .any(|p| p.file_name() == name.as_deref());
        if touches_config {
            let _ = wake_tx.try_send(());
        }
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
