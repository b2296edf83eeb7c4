use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a failed delivery is worth retrying with the same input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    None,
    Transient,
    Permanent,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Transient => "transient",
            Self::Permanent => "permanent",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("No channel client registered for type {channel_type:?}")]
    UnsupportedChannel { channel_type: String },

    #[error("Channel rejected credentials (status {status}): {body}")]
    AuthenticationRejected { status: u16, body: String },

    #[error("Malformed channel configuration: {message}")]
    MalformedConfiguration { message: String },

    #[error("Channel rejected the request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Notification timed out after {duration:?}")]
    TransportTimeout { duration: Duration },

    #[error("Channel rate limited the request{}: {body}", retry_hint(.retry_after))]
    RateLimited {
        retry_after: Option<Duration>,
        body: String,
    },

    #[error("Channel unavailable (status {status}): {body}")]
    ServerUnavailable { status: u16, body: String },

    #[error("Connection to channel failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Notification cancelled before delivery completed")]
    Cancelled,
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(" (retry after {}s)", delay.as_secs()),
        None => String::new(),
    }
}

impl NotifyError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedConfiguration {
            message: message.into(),
        }
    }

    /// Maps a non-success HTTP response onto the taxonomy, keeping the body verbatim.
    pub fn from_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::AuthenticationRejected {
                status: status.as_u16(),
                body,
            },
            429 => Self::RateLimited { retry_after, body },
            code if status.is_server_error() => Self::ServerUnavailable { status: code, body },
            code => Self::Rejected { status: code, body },
        }
    }

    /// Maps a request-level failure (no response received) onto the taxonomy.
    ///
    /// The attempt deadline belongs to the dispatcher, so a timeout configured
    /// on a caller-supplied client surfaces as a connection failure.
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::MalformedConfiguration {
                message: err.to_string(),
            }
        } else {
            Self::ConnectionFailed {
                message: err.to_string(),
            }
        }
    }

    pub fn error_label(&self) -> &'static str {
        match self {
            Self::UnsupportedChannel { .. } => "unsupported_channel",
            Self::AuthenticationRejected { .. } => "authentication_rejected",
            Self::MalformedConfiguration { .. } => "malformed_configuration",
            Self::Rejected { .. } => "rejected",
            Self::TransportTimeout { .. } => "transport_timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerUnavailable { .. } => "server_unavailable",
            Self::ConnectionFailed { .. } => "connection_failed",
            Self::Cancelled => "cancelled",
        }
    }
}
