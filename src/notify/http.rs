use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response};
use tracing::warn;

use crate::notify::error::NotifyError;

const USER_AGENT: &str = concat!("schemanotify/", env!("CARGO_PKG_VERSION"));

/// Builds the pooled HTTP client shared by the HTTP-based channels.
///
/// No request timeout is set here: each send is bounded by the timeout the
/// dispatcher receives from its caller.
pub fn build_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|err| {
            warn!(error = %err, "Failed to build notification http client; using defaults");
            Client::new()
        })
}

/// Passes 2xx responses through; anything else becomes a taxonomy error
/// carrying the response body verbatim.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = retry_after(response.headers());
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => format!("<unreadable response body: {err}>"),
    };
    Err(NotifyError::from_status(status, retry_after, body))
}

pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
