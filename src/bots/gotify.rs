//! Gotify push notifier.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use super::http::{build_http_client, post_json, DEFAULT_MAX_RETRIES};
use super::{Notifier, NotifyError};
use crate::config::{GotifyConfig, DEFAULT_GOTIFY_PRIORITY, DEFAULT_GOTIFY_TITLE};

#[derive(Debug, Serialize)]
struct GotifyMessage<'a> {
    title: &'a str,
    message: &'a str,
    priority: i32,
}

/// Posts notifications to a Gotify server.
#[derive(Debug, Clone)]
pub struct GotifyNotifier {
    client: Client,
    endpoint: Url,
    title: String,
    priority: i32,
    max_retries: u32,
}

impl GotifyNotifier {
    /// Create a notifier from configuration.
    ///
    /// An empty title falls back to the application name and a non-positive
    /// priority to medium.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidConfig`] if the URL or token is empty,
    /// or the URL cannot be parsed.
    pub fn new(config: &GotifyConfig) -> Result<Self, NotifyError> {
        if config.url.is_empty() {
            return Err(NotifyError::InvalidConfig(
                "gotify URL cannot be empty".to_string(),
            ));
        }
        if config.token.is_empty() {
            return Err(NotifyError::InvalidConfig(
                "gotify token cannot be empty".to_string(),
            ));
        }

        let base = config.url.trim_end_matches('/');
        let endpoint = Url::parse_with_params(
            &format!("{base}/message"),
            &[("token", config.token.as_str())],
        )
        .map_err(|e| NotifyError::InvalidConfig(format!("invalid gotify URL: {e}")))?;

        let title = if config.title.is_empty() {
            DEFAULT_GOTIFY_TITLE.to_string()
        } else {
            config.title.clone()
        };
        let priority = if config.priority <= 0 {
            DEFAULT_GOTIFY_PRIORITY
        } else {
            config.priority
        };

        Ok(Self {
            client: build_http_client()?,
            endpoint,
            title,
            priority,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set how many times server errors are retried (builder pattern).
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Send a message with an explicit priority.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-2xx status.
    pub async fn send_with_priority(&self, text: &str, priority: i32) -> Result<(), NotifyError> {
        let message = GotifyMessage {
            title: &self.title,
            message: text,
            priority,
        };
        post_json(&self.client, self.endpoint.as_str(), &message, self.max_retries).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for GotifyNotifier {
    async fn start(&self, _shutdown: tokio_util::sync::CancellationToken) -> Result<(), NotifyError> {
        tracing::info!("Gotify notification service ready");
        Ok(())
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.send_with_priority(text, self.priority).await
    }
}
