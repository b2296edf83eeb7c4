use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// A schema change detected during a sync run.
///
/// Produced upstream by the schema diff step and consumed read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaChangeEvent {
    connection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connection_name: Option<String>,
    is_breaking: bool,
    detected_at: DateTime<Utc>,
    #[serde(default)]
    reference_url: String,
}

impl SchemaChangeEvent {
    pub fn new(
        connection_id: impl Into<String>,
        is_breaking: bool,
        detected_at: DateTime<Utc>,
        reference_url: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            connection_name: None,
            is_breaking,
            detected_at,
            reference_url: reference_url.into(),
        }
    }

    pub fn with_connection_name(mut self, name: impl Into<String>) -> Self {
        self.connection_name = Some(name.into());
        self
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn connection_name(&self) -> Option<&str> {
        self.connection_name.as_deref()
    }

    pub fn is_breaking(&self) -> bool {
        self.is_breaking
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    pub fn reference_url(&self) -> &str {
        &self.reference_url
    }

    pub fn category(&self) -> &'static str {
        if self.is_breaking {
            "breaking"
        } else {
            "non_breaking"
        }
    }

    pub fn severity(&self) -> Severity {
        if self.is_breaking {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

/// Transport-agnostic rendered alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reference_url: String,
    pub severity: Severity,
    /// Stable across retries of the same event; channels with idempotency
    /// support forward it to the remote side.
    pub dedup_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn severity_follows_breaking_flag() {
        let breaking = SchemaChangeEvent::new("c1", true, timestamp(), "");
        let additive = SchemaChangeEvent::new("c1", false, timestamp(), "");

        assert_eq!(breaking.severity(), Severity::Warning);
        assert_eq!(additive.severity(), Severity::Info);
        assert_eq!(breaking.category(), "breaking");
        assert_eq!(additive.category(), "non_breaking");
    }

    #[test]
    fn event_deserializes_without_optional_fields() {
        let event: SchemaChangeEvent = serde_json::from_str(
            r#"{"connection_id":"c1","is_breaking":true,"detected_at":"2025-01-02T03:04:05Z"}"#,
        )
        .unwrap();

        assert_eq!(event.connection_id(), "c1");
        assert_eq!(event.reference_url(), "");
        assert!(event.connection_name().is_none());
        assert_eq!(event.detected_at(), timestamp());
    }

    #[test]
    fn severity_serializes_snake_case() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
