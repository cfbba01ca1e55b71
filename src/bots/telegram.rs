//! Telegram bot notifier.
//!
//! Sends notifications to a configured chat and answers a small set of
//! commands used to set the bot up.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::http::{build_http_client, post_json, request_error, DEFAULT_MAX_RETRIES};
use super::{Notifier, NotifyError};
use crate::config::TelegramConfig;

/// Sent by `/check` to the configured channel.
pub const CHECK_MESSAGE: &str =
    "If you received this message, everything is configured properly! :)";

const HELP_TEXT: &str = "Available commands:\n\n\
    /help - Get this help\n\
    /channel - Return the channel id\n\
    /check - Send a message using the channel id from the configuration file (to verify it's working)\n";

/// Default long-poll timeout for `getUpdates`.
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time allowed on top of the long-poll timeout before giving up.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Pause after a failed `getUpdates` call.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A message the bot should send in answer to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub chat_id: i64,
    pub text: String,
}

/// Sends notifications through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    token: String,
    channel_id: i64,
    max_retries: u32,
    poll_timeout: Duration,
}

impl TelegramNotifier {
    /// Create a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidConfig`] if the token is empty.
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        if config.token.is_empty() {
            return Err(NotifyError::InvalidConfig(
                "telegram token cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            client: build_http_client()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            channel_id: config.channel_id,
            max_retries: DEFAULT_MAX_RETRIES,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        })
    }

    /// Set how many times server errors are retried (builder pattern).
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the `getUpdates` long-poll timeout (builder pattern).
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    #[must_use]
    pub fn channel_id(&self) -> i64 {
        self.channel_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token)
    }

    /// Send `text` to an arbitrary chat.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the Bot API rejects it.
    pub async fn send_to(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        let response = post_json(
            &self.client,
            &self.method_url("sendMessage"),
            &SendMessage { chat_id, text },
            self.max_retries,
        )
        .await?;
        let _: serde_json::Value = parse_response(response).await?;
        Ok(())
    }

    /// Fetch pending updates starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the Bot API rejects it.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, NotifyError> {
        let body = GetUpdates {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ["message"],
        };
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(self.poll_timeout + POLL_GRACE)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::UnexpectedStatus(status.as_u16()));
        }
        parse_response(response).await
    }

    /// Work out the answer to a command message, if it is one.
    #[must_use]
    pub fn reply_for(&self, chat_id: i64, text: &str) -> Option<CommandReply> {
        let command = parse_command(text)?;
        let reply = match command {
            "channel" => CommandReply {
                chat_id,
                text: format!("Channel ID: {chat_id}"),
            },
            "check" => CommandReply {
                chat_id: self.channel_id,
                text: CHECK_MESSAGE.to_string(),
            },
            _ => CommandReply {
                chat_id,
                text: HELP_TEXT.to_string(),
            },
        };
        Some(reply)
    }

    /// Answer commands until `shutdown` is cancelled.
    pub async fn poll_commands(&self, shutdown: CancellationToken) {
        let mut offset = 0;
        loop {
            let result = tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::debug!("Closing Telegram command loop");
                    return;
                }
                result = self.get_updates(offset) => result,
            };

            match result {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(message) = update.message else {
                            continue;
                        };
                        let Some(reply) = message
                            .text
                            .as_deref()
                            .and_then(|text| self.reply_for(message.chat.id, text))
                        else {
                            continue;
                        };
                        if let Err(e) = self.send_to(reply.chat_id, &reply.text).await {
                            tracing::error!(chat_id = reply.chat_id, error = %e, "Error sending command reply");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Telegram getUpdates failed");
                    tokio::select! {
                        biased;

                        () = shutdown.cancelled() => return,
                        () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            }
        }
    }
}

/// Extract the command name from a message such as `/channel@my_bot extra`.
fn parse_command(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    let command = command.split('@').next().unwrap_or(command);
    Some(command)
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, NotifyError> {
    let body: ApiResponse<T> = response
        .json()
        .await
        .map_err(|e| NotifyError::Api(format!("invalid response: {e}")))?;
    if !body.ok {
        return Err(NotifyError::Api(
            body.description
                .unwrap_or_else(|| "request rejected".to_string()),
        ));
    }
    body.result
        .ok_or_else(|| NotifyError::Api("response without result".to_string()))
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn start(&self, shutdown: CancellationToken) -> Result<(), NotifyError> {
        let bot = self.clone();
        tokio::spawn(async move { bot.poll_commands(shutdown).await });
        tracing::info!("Telegram command loop started");
        Ok(())
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if self.channel_id == 0 {
            return Err(NotifyError::MissingChannel);
        }
        self.send_to(self.channel_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(channel_id: i64) -> TelegramNotifier {
        TelegramNotifier::new(&TelegramConfig {
            token: "TESTTOKEN".to_string(),
            channel_id,
            api_url: "http://localhost:1/".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = TelegramNotifier::new(&TelegramConfig::default());
        assert!(matches!(result, Err(NotifyError::InvalidConfig(_))));
    }

    #[test]
    fn test_method_url() {
        assert_eq!(
            notifier(0).method_url("sendMessage"),
            "http://localhost:1/botTESTTOKEN/sendMessage"
        );
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/help"), Some("help"));
        assert_eq!(parse_command("/channel@afk_bot"), Some("channel"));
        assert_eq!(parse_command("  /check now"), Some("check"));
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_channel_reply_uses_sender_chat() {
        let reply = notifier(42).reply_for(-1001, "/channel").unwrap();
        assert_eq!(reply.chat_id, -1001);
        assert_eq!(reply.text, "Channel ID: -1001");
    }

    #[test]
    fn test_check_reply_goes_to_configured_channel() {
        let reply = notifier(42).reply_for(7, "/check").unwrap();
        assert_eq!(reply.chat_id, 42);
        assert_eq!(reply.text, CHECK_MESSAGE);
    }

    #[test]
    fn test_unknown_command_gets_help() {
        let reply = notifier(42).reply_for(7, "/dance").unwrap();
        assert_eq!(reply.chat_id, 7);
        assert!(reply.text.starts_with("Available commands:"));
        assert!(reply.text.contains("/channel - Return the channel id"));
    }

    #[test]
    fn test_plain_text_ignored() {
        assert!(notifier(42).reply_for(7, "o7").is_none());
    }

    #[tokio::test]
    async fn test_send_without_channel_fails() {
        let err = notifier(0).send("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::MissingChannel));
    }

    #[tokio::test]
    async fn test_poll_commands_stops_on_shutdown() {
        let bot = notifier(42);
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), bot.poll_commands(shutdown))
            .await
            .expect("command loop did not stop");
    }
}
