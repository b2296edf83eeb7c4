use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use crate::config::schema::{ChannelConfig, WEBHOOK_CHANNEL};
use crate::notify::channel::{ChannelClient, mismatched_config};
use crate::notify::error::NotifyError;
use crate::notify::events::Message;
use crate::notify::http::ensure_success;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// POSTs the rendered message as JSON to an arbitrary endpoint.
pub struct WebhookChannelClient {
    client: Client,
}

impl WebhookChannelClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelClient for WebhookChannelClient {
    fn channel_type(&self) -> &'static str {
        WEBHOOK_CHANNEL
    }

    async fn send(&self, message: &Message, config: &ChannelConfig) -> Result<(), NotifyError> {
        let ChannelConfig::Webhook(webhook) = config else {
            return Err(mismatched_config(WEBHOOK_CHANNEL, config));
        };
        if webhook.url.trim().is_empty() {
            return Err(NotifyError::malformed("webhook url is empty"));
        }

        let request = self
            .client
            .post(&webhook.url)
            .header(IDEMPOTENCY_HEADER, message.dedup_key.as_str())
            .json(message);
        let request = apply_headers(request, webhook.headers.as_ref())?;

        let response = request
            .send()
            .await
            .map_err(NotifyError::from_request)?;
        ensure_success(response).await?;

        debug!(
            channel = self.channel_type(),
            dedup_key = %message.dedup_key,
            "Webhook notification sent"
        );
        Ok(())
    }
}

fn apply_headers(
    request: reqwest::RequestBuilder,
    headers: Option<&HashMap<String, String>>,
) -> Result<reqwest::RequestBuilder, NotifyError> {
    let Some(headers) = headers else {
        return Ok(request);
    };

    let mut request = request;
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| NotifyError::malformed(format!("invalid webhook header name {key:?}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| NotifyError::malformed(format!("invalid value for webhook header {key}")))?;
        request = request.header(name, value);
    }
    Ok(request)
}
