use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SLACK_CHANNEL: &str = "slack";
pub const WEBHOOK_CHANNEL: &str = "webhook";
pub const EMAIL_CHANNEL: &str = "email";

/// Root configuration for schemanotify.
///
/// Example:
/// ```toml
/// [logging]
/// level = "info"
///
/// [dispatch]
/// timeout_secs = 10
///
/// [notifications]
/// send_on_non_breaking = false
///
/// [notifications.channel]
/// type = "slack"
/// webhook_url = "https://hooks.slack.com/services/T000/B000/XXXX"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration section.
    /// Example: [logging]
    pub logging: LoggingConfig,
    /// Dispatch behaviour configuration section.
    /// Example: [dispatch]
    pub dispatch: DispatchConfig,
    /// Notification policy and channel section.
    /// Example: [notifications]
    pub notifications: NotificationSettings,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    /// Example: level = "info"
    pub level: String,
    /// Emit JSON log lines instead of human-readable text.
    /// Example: json = false
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound for a single channel send (seconds).
    /// Example: timeout_secs = 10
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Per-call notification policy plus the channel it targets.
///
/// The policy decides which event categories are delivered; the channel decides
/// where they go. A missing channel is a configuration error, not a skip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationSettings {
    /// Deliver alerts for breaking schema changes.
    /// Example: send_on_breaking = true
    pub send_on_breaking: bool,
    /// Deliver alerts for non-breaking schema changes.
    /// Example: send_on_non_breaking = true
    pub send_on_non_breaking: bool,
    /// Channel the alert is delivered to.
    /// Example: [notifications.channel]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelConfig>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            send_on_breaking: true,
            send_on_non_breaking: true,
            channel: None,
        }
    }
}

impl NotificationSettings {
    pub fn new(channel: ChannelConfig) -> Self {
        Self {
            channel: Some(channel),
            ..Self::default()
        }
    }

    pub fn breaking_only(channel: ChannelConfig) -> Self {
        Self {
            send_on_non_breaking: false,
            ..Self::new(channel)
        }
    }

    /// Returns whether an event of the given category should be delivered.
    pub fn allows(&self, is_breaking: bool) -> bool {
        if is_breaking {
            self.send_on_breaking
        } else {
            self.send_on_non_breaking
        }
    }
}

/// Transport configuration, tagged by channel type.
///
/// Unrecognised tags are kept as [`ChannelConfig::Other`] so that an
/// unsupported channel surfaces as a delivery failure instead of a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChannelConfig", into = "RawChannelConfig")]
pub enum ChannelConfig {
    Slack(SlackConfig),
    Webhook(WebhookConfig),
    Email(EmailConfig),
    Other {
        channel_type: String,
        settings: Map<String, Value>,
    },
}

impl ChannelConfig {
    pub fn channel_type(&self) -> &str {
        match self {
            Self::Slack(_) => SLACK_CHANNEL,
            Self::Webhook(_) => WEBHOOK_CHANNEL,
            Self::Email(_) => EMAIL_CHANNEL,
            Self::Other { channel_type, .. } => channel_type,
        }
    }

    pub fn other(channel_type: impl Into<String>) -> Self {
        Self::Other {
            channel_type: channel_type.into(),
            settings: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawChannelConfig {
    #[serde(rename = "type")]
    channel_type: String,
    #[serde(flatten)]
    settings: Map<String, Value>,
}

impl TryFrom<RawChannelConfig> for ChannelConfig {
    type Error = String;

    fn try_from(raw: RawChannelConfig) -> Result<Self, Self::Error> {
        let tag = raw.channel_type.to_ascii_lowercase();
        let settings = Value::Object(raw.settings.clone());
        match tag.as_str() {
            SLACK_CHANNEL => serde_json::from_value(settings)
                .map(Self::Slack)
                .map_err(|err| format!("invalid slack channel settings: {err}")),
            WEBHOOK_CHANNEL => serde_json::from_value(settings)
                .map(Self::Webhook)
                .map_err(|err| format!("invalid webhook channel settings: {err}")),
            EMAIL_CHANNEL => serde_json::from_value(settings)
                .map(Self::Email)
                .map_err(|err| format!("invalid email channel settings: {err}")),
            _ => Ok(Self::Other {
                channel_type: raw.channel_type,
                settings: raw.settings,
            }),
        }
    }
}

impl From<ChannelConfig> for RawChannelConfig {
    fn from(config: ChannelConfig) -> Self {
        let channel_type = config.channel_type().to_string();
        let settings = match config {
            ChannelConfig::Slack(slack) => to_settings(&slack),
            ChannelConfig::Webhook(webhook) => to_settings(&webhook),
            ChannelConfig::Email(email) => to_settings(&email),
            ChannelConfig::Other { settings, .. } => settings,
        };
        Self {
            channel_type,
            settings,
        }
    }
}

fn to_settings<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Slack channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SlackConfig {
    /// Slack incoming webhook URL.
    /// Example: webhook_url = "https://hooks.slack.com/services/..."
    #[serde(default)]
    pub webhook_url: String,
    /// Bot token; when set together with `channel`, messages go through the Web API.
    /// Example: bot_token = "xoxb-..."
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Channel ID or name for Web API delivery.
    /// Example: channel = "#data-alerts"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl SlackConfig {
    pub fn webhook(url: impl Into<String>) -> Self {
        Self {
            webhook_url: url.into(),
            ..Self::default()
        }
    }

    /// Bot token and channel, when both are configured.
    pub fn bot_credentials(&self) -> Option<(&str, &str)> {
        match (self.bot_token.as_deref(), self.channel.as_deref()) {
            (Some(token), Some(channel)) if !token.trim().is_empty() => Some((token, channel)),
            _ => None,
        }
    }
}

/// Generic webhook channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookConfig {
    /// Webhook URL.
    /// Example: url = "https://example.com/hooks"
    pub url: String,
    /// Optional custom headers.
    /// Example: headers = { Authorization = "Bearer token" }
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// SMTP email channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailConfig {
    /// SMTP relay host.
    /// Example: smtp_host = "smtp.example.com"
    pub smtp_host: String,
    /// SMTP port (STARTTLS).
    /// Example: smtp_port = 587
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Sender mailbox.
    /// Example: from = "Alerts <alerts@example.com>"
    pub from: String,
    /// Recipient mailboxes.
    /// Example: to = ["oncall@example.com"]
    #[serde(default)]
    pub to: Vec<String>,
}

fn default_smtp_port() -> u16 {
    587
}
