//! Schema change notification dispatch.

pub mod channel;
pub mod classifier;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod events;
pub mod formatter;
pub mod http;
pub mod outcome;
pub mod registry;
pub mod slack;
pub mod webhook;

pub use channel::ChannelClient;
pub use classifier::{DefaultErrorClassifier, ErrorClassifier};
pub use dispatcher::Dispatcher;
pub use email::EmailChannelClient;
pub use error::{FailureKind, NotifyError};
pub use events::{Message, SchemaChangeEvent, Severity};
pub use formatter::MessageFormatter;
pub use outcome::{DeliveryResult, DeliveryStatus};
pub use registry::ChannelRegistry;
pub use slack::SlackChannelClient;
pub use webhook::WebhookChannelClient;
