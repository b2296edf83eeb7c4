use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::schema::{ChannelConfig, SLACK_CHANNEL, SlackConfig};
use crate::notify::channel::{ChannelClient, mismatched_config};
use crate::notify::error::NotifyError;
use crate::notify::events::{Message, Severity};
use crate::notify::http::{ensure_success, retry_after};

const SLACK_API_BASE: &str = "https://slack.com/api";
// Slack rejects header blocks longer than this.
const HEADER_LIMIT: usize = 150;

/// Delivers messages to Slack through an incoming webhook, or through
/// `chat.postMessage` when a bot token and channel are configured.
pub struct SlackChannelClient {
    client: Client,
    api_base: String,
}

impl SlackChannelClient {
    pub fn new(client: Client) -> Self {
        Self::with_api_base(client, SLACK_API_BASE)
    }

    pub fn with_api_base(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_webhook(&self, url: &str, payload: &SlackPayload<'_>) -> Result<(), NotifyError> {
        if url.trim().is_empty() {
            return Err(NotifyError::malformed("slack webhook_url is empty"));
        }

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(NotifyError::from_request)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn post_message(
        &self,
        token: &str,
        payload: &SlackPayload<'_>,
    ) -> Result<(), NotifyError> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(NotifyError::from_request)?;
        let response = ensure_success(response).await?;
        let delay = retry_after(response.headers());
        let body = response.text().await.map_err(|err| NotifyError::ConnectionFailed {
            message: format!("slack response body: {err}"),
        })?;

        let api: SlackApiResponse =
            serde_json::from_str(&body).map_err(|err| NotifyError::ServerUnavailable {
                status: 200,
                body: format!("unparseable slack response ({err}): {body}"),
            })?;
        if api.ok {
            return Ok(());
        }
        Err(api_error(api.error.as_deref().unwrap_or("unknown_error"), delay, body))
    }
}

#[async_trait]
impl ChannelClient for SlackChannelClient {
    fn channel_type(&self) -> &'static str {
        SLACK_CHANNEL
    }

    async fn send(&self, message: &Message, config: &ChannelConfig) -> Result<(), NotifyError> {
        let ChannelConfig::Slack(slack) = config else {
            return Err(mismatched_config(SLACK_CHANNEL, config));
        };

        let mut payload = build_payload(message);
        match slack.bot_credentials() {
            Some((token, channel)) => {
                payload.channel = Some(channel);
                self.post_message(token, &payload).await?;
            }
            None => self.post_webhook(&slack.webhook_url, &payload).await?,
        }

        debug!(
            channel = self.channel_type(),
            mode = delivery_mode(slack),
            severity = message.severity.as_str(),
            "Slack notification sent"
        );
        Ok(())
    }
}

fn delivery_mode(config: &SlackConfig) -> &'static str {
    if config.bot_credentials().is_some() {
        "web_api"
    } else {
        "webhook"
    }
}

/// Maps a Slack Web API `error` code onto the shared taxonomy.
fn api_error(code: &str, retry_after: Option<std::time::Duration>, body: String) -> NotifyError {
    match code {
        "invalid_auth" | "not_authed" | "token_revoked" | "token_expired" | "account_inactive" => {
            NotifyError::AuthenticationRejected { status: 200, body }
        }
        "ratelimited" | "rate_limited" => NotifyError::RateLimited { retry_after, body },
        "internal_error" | "fatal_error" | "service_unavailable" | "request_timeout" => {
            NotifyError::ServerUnavailable { status: 200, body }
        }
        _ => NotifyError::Rejected { status: 200, body },
    }
}

#[derive(Debug, Serialize)]
struct SlackPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    text: &'a str,
    blocks: Vec<SlackBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum SlackBlock {
    #[serde(rename = "header")]
    Header { text: SlackText },
    #[serde(rename = "section")]
    Section { text: SlackText },
    #[serde(rename = "context")]
    Context { elements: Vec<SlackText> },
}

#[derive(Debug, Serialize)]
struct SlackText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: String,
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

fn build_payload(message: &Message) -> SlackPayload<'_> {
    let mut blocks = vec![
        SlackBlock::Header {
            text: SlackText {
                text_type: "plain_text",
                text: format!(
                    "{} {}",
                    severity_emoji(message.severity),
                    truncate(&message.title, HEADER_LIMIT - 3)
                ),
            },
        },
        SlackBlock::Section {
            text: SlackText {
                text_type: "mrkdwn",
                text: message.body.clone(),
            },
        },
    ];
    if !message.reference_url.is_empty() {
        blocks.push(SlackBlock::Context {
            elements: vec![SlackText {
                text_type: "mrkdwn",
                text: format!("<{}|Open connection>", message.reference_url),
            }],
        });
    }

    SlackPayload {
        channel: None,
        text: &message.title,
        blocks,
    }
}

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "ℹ️",
        Severity::Warning => "⚠️",
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(reference_url: &str) -> Message {
        Message {
            title: "Action required: breaking schema change on connection c1".to_string(),
            body: "The source schema changed.".to_string(),
            reference_url: reference_url.to_string(),
            severity: Severity::Warning,
            dedup_key: "k".to_string(),
        }
    }

    #[test]
    fn payload_has_header_section_and_link() {
        let message = message("https://x/y");
        let payload = serde_json::to_value(build_payload(&message)).unwrap();

        assert_eq!(payload["text"], message.title.as_str());
        assert!(payload.get("channel").is_none());
        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0]["type"], "header");
        assert!(blocks[0]["text"]["text"].as_str().unwrap().starts_with("⚠️"));
        assert_eq!(blocks[1]["text"]["type"], "mrkdwn");
        assert_eq!(blocks[2]["elements"][0]["text"], "<https://x/y|Open connection>");
    }

    #[test]
    fn payload_omits_link_without_reference_url() {
        let message = message("");
        let payload = serde_json::to_value(build_payload(&message)).unwrap();
        assert_eq!(payload["blocks"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn long_titles_are_truncated_for_header_block() {
        let long = "x".repeat(400);
        let truncated = truncate(&long, HEADER_LIMIT - 3);
        assert_eq!(truncated.chars().count(), HEADER_LIMIT - 3);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn api_error_codes_map_to_taxonomy() {
        assert!(matches!(
            api_error("invalid_auth", None, String::new()),
            NotifyError::AuthenticationRejected { .. }
        ));
        assert!(matches!(
            api_error("ratelimited", None, String::new()),
            NotifyError::RateLimited { .. }
        ));
        assert!(matches!(
            api_error("internal_error", None, String::new()),
            NotifyError::ServerUnavailable { .. }
        ));
        assert!(matches!(
            api_error("channel_not_found", None, String::new()),
            NotifyError::Rejected { .. }
        ));
    }

    #[tokio::test]
    async fn empty_webhook_url_fails_without_request() {
        let client = SlackChannelClient::new(Client::new());
        let config = ChannelConfig::Slack(SlackConfig::webhook(""));

        let err = client.send(&message(""), &config).await.unwrap_err();
        assert!(matches!(err, NotifyError::MalformedConfiguration { .. }));
    }

    #[tokio::test]
    async fn foreign_config_is_rejected() {
        let client = SlackChannelClient::new(Client::new());
        let err = client
            .send(&message(""), &ChannelConfig::other("PagerDuty"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("slack client received PagerDuty"));
    }
}
