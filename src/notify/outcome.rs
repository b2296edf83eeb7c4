use serde::{Deserialize, Serialize};

use crate::notify::error::FailureKind;

/// Terminal state of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Skipped,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Outcome handed back to the workflow engine.
///
/// Only `Failed` with a transient failure kind is worth retrying; everything
/// else is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub status: DeliveryStatus,
    pub failure_kind: FailureKind,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl DeliveryResult {
    pub fn sent(channel: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Sent,
            failure_kind: FailureKind::None,
            detail: String::new(),
            channel: Some(channel.into()),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Skipped,
            failure_kind: FailureKind::None,
            detail: reason.into(),
            channel: None,
        }
    }

    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            failure_kind: kind,
            detail: detail.into(),
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }

    pub fn should_retry(&self) -> bool {
        self.status == DeliveryStatus::Failed && self.failure_kind == FailureKind::Transient
    }
}
