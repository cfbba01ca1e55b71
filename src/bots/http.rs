//! Shared HTTP plumbing for the remote notifiers.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;

use super::NotifyError;

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries for server errors.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Build an HTTP client with proper timeout configuration.
pub(crate) fn build_http_client() -> Result<Client, NotifyError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| NotifyError::InvalidConfig(format!("cannot build HTTP client: {e}")))
}

/// Determine if a request should be retried based on status code and attempt count.
pub(crate) fn should_retry(status_code: u16, attempt: u32, max_retries: u32) -> bool {
    if attempt >= max_retries {
        return false;
    }
    (500..600).contains(&status_code)
}

/// Calculate exponential backoff duration for retry attempts.
pub(crate) fn calculate_backoff(attempt: u32) -> Duration {
    // 500ms, 1s, 2s, ...
    Duration::from_millis(500 << attempt.min(6))
}

pub(crate) fn request_error(e: &reqwest::Error) -> NotifyError {
    if e.is_timeout() {
        NotifyError::Timeout
    } else {
        NotifyError::RequestFailed(e.to_string())
    }
}

/// POST a JSON body, retrying server errors.
///
/// Returns the first successful response; any other status ends in
/// [`NotifyError::UnexpectedStatus`].
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &T,
    max_retries: u32,
) -> Result<Response, NotifyError> {
    let mut attempt = 0;
    loop {
        let response = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| request_error(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        if should_retry(status_code, attempt, max_retries) {
            let backoff = calculate_backoff(attempt);
            tracing::debug!(status = status_code, attempt, ?backoff, "Retrying notification");
            tokio::time::sleep(backoff).await;
            attempt += 1;
            continue;
        }

        return Err(NotifyError::UnexpectedStatus(status_code));
    }
}
