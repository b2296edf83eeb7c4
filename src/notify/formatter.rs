use sha2::{Digest, Sha256};

use crate::notify::events::{Message, SchemaChangeEvent};

/// Renders schema change events into channel-neutral messages.
///
/// Rendering only reads the event, so the same event always yields the same
/// bytes, including the dedup key.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFormatter;

impl MessageFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, event: &SchemaChangeEvent) -> Message {
        let subject = connection_label(event);
        let (title, mut body) = if event.is_breaking() {
            (
                format!("Action required: breaking schema change on {subject}"),
                format!(
                    "The source schema for {subject} changed in a way that will break syncs. \
                     The connection has been disabled. Refresh the source schema on the \
                     connection page and approve the changes to re-enable syncs."
                ),
            )
        } else {
            (
                format!("Schema change detected on {subject}"),
                format!(
                    "The source schema for {subject} changed. Syncs will continue; review the \
                     changes on the connection page."
                ),
            )
        };

        body.push_str(&format!(
            "\nDetected at: {}",
            event.detected_at().to_rfc3339()
        ));
        if !event.reference_url().is_empty() {
            body.push_str(&format!("\n{}", event.reference_url()));
        }

        Message {
            title,
            body,
            reference_url: event.reference_url().to_string(),
            severity: event.severity(),
            dedup_key: dedup_key(event),
        }
    }
}

fn connection_label(event: &SchemaChangeEvent) -> String {
    match event.connection_name() {
        Some(name) => format!("connection {name} ({})", event.connection_id()),
        None => format!("connection {}", event.connection_id()),
    }
}

fn dedup_key(event: &SchemaChangeEvent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(event.connection_id().as_bytes());
    hasher.update([0, u8::from(event.is_breaking())]);
    hasher.update(event.detected_at().to_rfc3339().as_bytes());
    hasher.update([0]);
    hasher.update(event.reference_url().as_bytes());
    hex::encode(hasher.finalize())
}
