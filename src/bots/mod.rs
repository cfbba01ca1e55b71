//! Outbound notifiers.
//!
//! The engine only knows the [`Notifier`] trait; transports live behind it.

mod console;
mod gotify;
mod http;
mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, BotKind};

pub use console::ConsoleNotifier;
pub use gotify::GotifyNotifier;
pub use http::DEFAULT_MAX_RETRIES;
pub use telegram::{Chat, CommandReply, Message, TelegramNotifier, Update, CHECK_MESSAGE};

/// Errors from notifier operations.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("empty channel id, please use the /channel command to obtain the value from the bot")]
    MissingChannel,
    #[error("Invalid notifier configuration: {0}")]
    InvalidConfig(String),
    #[error("Notification request failed: {0}")]
    RequestFailed(String),
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),
    #[error("Bot API error: {0}")]
    Api(String),
    #[error("Notification request timed out")]
    Timeout,
}

/// A destination for notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Begin accepting inbound commands, if the transport has any.
    ///
    /// Background work must end when `shutdown` is cancelled.
    async fn start(&self, shutdown: CancellationToken) -> Result<(), NotifyError> {
        let _ = shutdown;
        Ok(())
    }

    /// Deliver one notification.
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Build the notifier selected by `bot.kind`.
///
/// # Errors
///
/// Returns [`NotifyError::InvalidConfig`] if the selected transport is
/// missing required settings.
pub fn build_notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    let notifier: Arc<dyn Notifier> = match config.bot.kind {
        BotKind::Console => Arc::new(ConsoleNotifier::new()),
        BotKind::Telegram => Arc::new(TelegramNotifier::new(&config.telegram)?),
        BotKind::Gotify => Arc::new(GotifyNotifier::new(&config.gotify)?),
    };
    tracing::debug!(kind = ?config.bot.kind, "Notifier ready");
    Ok(notifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BotConfig, GotifyConfig, TelegramConfig};

    #[test]
    fn test_missing_channel_display() {
        assert_eq!(
            NotifyError::MissingChannel.to_string(),
            "empty channel id, please use the /channel command to obtain the value from the bot"
        );
    }

    #[test]
    fn test_unexpected_status_display() {
        assert_eq!(
            NotifyError::UnexpectedStatus(502).to_string(),
            "unexpected status code: 502"
        );
    }

    #[test]
    fn test_build_console_by_default() {
        assert!(build_notifier(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_build_gotify_requires_url() {
        let config = AppConfig {
            bot: BotConfig {
                kind: BotKind::Gotify,
            },
            gotify: GotifyConfig {
                token: "abc".to_string(),
                ..GotifyConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(matches!(
            build_notifier(&config),
            Err(NotifyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_build_telegram_requires_token() {
        let config = AppConfig {
            bot: BotConfig {
                kind: BotKind::Telegram,
            },
            telegram: TelegramConfig::default(),
            ..AppConfig::default()
        };
        assert!(matches!(
            build_notifier(&config),
            Err(NotifyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_build_telegram_with_token() {
        let config = AppConfig {
            bot: BotConfig {
                kind: BotKind::Telegram,
            },
            telegram: TelegramConfig {
                token: "123:abc".to_string(),
                ..TelegramConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(build_notifier(&config).is_ok());
    }
}
