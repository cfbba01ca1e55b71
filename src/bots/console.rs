//! Notifier that prints to the terminal.

use async_trait::async_trait;

use super::{Notifier, NotifyError};
use crate::display;

/// Prints notifications to stdout. Used when no remote bot is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        display::print_notification(text);
        Ok(())
    }
}
