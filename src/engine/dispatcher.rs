//! Event dispatcher for live journal lines.

use chrono::{DateTime, Utc};

use super::handlers::{self, HandlerOutcome};
use super::state::ReconciledState;
use crate::config::NotifySettings;
use crate::journal::JournalEvent;

/// Result of dispatching one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Text to send. Always `None` when the event was suppressed.
    pub notification: Option<String>,
    /// The handler produced a message but the event predates process start.
    pub suppressed: bool,
    /// The journal should be reconstructed from scratch.
    pub reconcile: bool,
}

/// Routes decoded events to their handlers and applies backlog suppression.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    settings: NotifySettings,
    process_start: DateTime<Utc>,
}

impl EventDispatcher {
    /// Create a dispatcher whose backlog boundary is now.
    #[must_use]
    pub fn new(settings: NotifySettings) -> Self {
        Self::with_process_start(settings, Utc::now())
    }

    /// Create a dispatcher with an explicit backlog boundary.
    #[must_use]
    pub fn with_process_start(settings: NotifySettings, process_start: DateTime<Utc>) -> Self {
        Self {
            settings,
            process_start,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &NotifySettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: NotifySettings) {
        if settings != self.settings {
            tracing::debug!(?settings, "Dispatcher settings updated");
            self.settings = settings;
        }
    }

    #[must_use]
    pub fn process_start(&self) -> DateTime<Utc> {
        self.process_start
    }

    /// Whether notifications for an event written at `timestamp` are muted.
    #[must_use]
    pub fn is_suppressed(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp < self.process_start
    }

    /// Apply an event to the state and decide what to send.
    ///
    /// State changes are committed regardless of suppression.
    pub fn dispatch(&self, state: &mut ReconciledState, event: &JournalEvent) -> Dispatch {
        let suppress = self.is_suppressed(event.timestamp);
        let HandlerOutcome {
            notification,
            reconcile,
        } = handlers::apply(state, event, &self.settings);

        tracing::trace!(
            kind = event.kind.name(),
            suppress,
            reconcile,
            "Dispatched journal event"
        );

        if suppress {
            Dispatch {
                suppressed: notification.is_some(),
                notification: None,
                reconcile,
            }
        } else {
            Dispatch {
                notification,
                suppressed: false,
                reconcile,
            }
        }
    }
}
