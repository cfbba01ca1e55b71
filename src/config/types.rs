//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::journal::default_journal_dir;

/// Per-category notification switches consumed by the event handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Notify about fighter hull damage.
    pub fighter: bool,
    /// Notify about shields going up or down.
    pub shields: bool,
    /// Notify about killed pirates.
    pub kills: bool,
    /// Only notify every tenth kill.
    pub silent_kills: bool,
}

/// Journal location and polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Directory holding the journal files.
    pub path: Option<PathBuf>,
    /// Seconds between rotation checks.
    pub rotation_interval_secs: u64,
    /// Log every tailed journal line.
    pub debug: bool,
}

/// Default seconds between rotation checks.
pub const DEFAULT_ROTATION_INTERVAL_SECS: u64 = 30;

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: None,
            rotation_interval_secs: DEFAULT_ROTATION_INTERVAL_SECS,
            debug: false,
        }
    }
}

impl JournalConfig {
    /// The configured directory, falling back to the game's default location.
    #[must_use]
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(default_journal_dir)
    }

    /// Interval between rotation checks, never shorter than one second.
    #[must_use]
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs.max(1))
    }
}

/// Outbound notification transport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotKind {
    #[default]
    Console,
    Telegram,
    Gotify,
}

/// Bot selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub kind: BotKind,
}

/// Telegram bot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from `@BotFather`.
    pub token: String,
    /// Chat receiving notifications. Zero means not configured yet.
    pub channel_id: i64,
    /// Bot API base URL.
    pub api_url: String,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: 0,
            api_url: default_telegram_api_url(),
        }
    }
}

/// Gotify server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GotifyConfig {
    pub url: String,
    /// Application token.
    pub token: String,
    pub title: String,
    pub priority: i32,
}

/// Title used when none is configured.
pub const DEFAULT_GOTIFY_TITLE: &str = "ED-AFK-Notifier";

/// Priority used when none (or a non-positive one) is configured.
pub const DEFAULT_GOTIFY_PRIORITY: i32 = 5;

impl Default for GotifyConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            title: DEFAULT_GOTIFY_TITLE.to_string(),
            priority: DEFAULT_GOTIFY_PRIORITY,
        }
    }
}

/// Status endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Whether to enable permissive CORS.
    pub cors_permissive: bool,
}

/// Default port for the status server.
pub const DEFAULT_STATUS_PORT: u16 = 3000;

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_STATUS_PORT,
            cors_permissive: true,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub journal: JournalConfig,
    pub notify: NotifySettings,
    pub bot: BotConfig,
    pub telegram: TelegramConfig,
    pub gotify: GotifyConfig,
    pub status: StatusConfig,
}

impl AppConfig {
    /// Log the effective notification configuration.
    pub fn log_summary(&self) {
        let journal = self
            .journal
            .resolved_path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        tracing::info!(
            fighter = self.notify.fighter,
            shields = self.notify.shields,
            kills = self.notify.kills,
            silent_kills = self.notify.silent_kills,
            bot = ?self.bot.kind,
            journal = %journal,
            "Loaded configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_settings_default_all_off() {
        let settings = NotifySettings::default();
        assert!(!settings.fighter);
        assert!(!settings.shields);
        assert!(!settings.kills);
        assert!(!settings.silent_kills);
    }

    #[test]
    fn test_journal_config_defaults() {
        let config = JournalConfig::default();
        assert!(config.path.is_none());
        assert_eq!(config.rotation_interval(), Duration::from_secs(30));
        assert!(!config.debug);
    }

    #[test]
    fn test_rotation_interval_floor() {
        let config = JournalConfig {
            rotation_interval_secs: 0,
            ..JournalConfig::default()
        };
        assert_eq!(config.rotation_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_resolved_path_prefers_configured() {
        let config = JournalConfig {
            path: Some(PathBuf::from("/games/journals")),
            ..JournalConfig::default()
        };
        assert_eq!(config.resolved_path(), Some(PathBuf::from("/games/journals")));
    }

    #[test]
    fn test_app_config_deserialize() {
        let toml = r#"
            [journal]
            path = "/games/journals"
            rotation_interval_secs = 45
            debug = true

            [notify]
            fighter = true
            kills = true
            silent_kills = true

            [bot]
            kind = "gotify"

            [gotify]
            url = "https://gotify.example.com"
            token = "abc123"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.journal.path, Some(PathBuf::from("/games/journals")));
        assert_eq!(config.journal.rotation_interval_secs, 45);
        assert!(config.journal.debug);
        assert!(config.notify.fighter);
        assert!(!config.notify.shields);
        assert!(config.notify.kills);
        assert!(config.notify.silent_kills);
        assert_eq!(config.bot.kind, BotKind::Gotify);
        assert_eq!(config.gotify.url, "https://gotify.example.com");
        assert_eq!(config.gotify.title, DEFAULT_GOTIFY_TITLE);
        assert_eq!(config.gotify.priority, DEFAULT_GOTIFY_PRIORITY);
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert!(!config.status.enabled);
    }

    #[test]
    fn test_app_config_telegram() {
        let toml = r#"
            [bot]
            kind = "telegram"

            [telegram]
            token = "123:abc"
            channel_id = -1001234
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bot.kind, BotKind::Telegram);
        assert_eq!(config.telegram.token, "123:abc");
        assert_eq!(config.telegram.channel_id, -1_001_234);
    }

    #[test]
    fn test_status_config_defaults() {
        let config = StatusConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.cors_permissive);
    }
}
