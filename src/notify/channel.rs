use async_trait::async_trait;

use crate::config::schema::ChannelConfig;
use crate::notify::error::NotifyError;
use crate::notify::events::Message;

/// One transport capable of delivering a rendered [`Message`].
///
/// Implementations are shared across concurrent dispatches and must not keep
/// per-message state. They must not retry either; the caller owns that policy.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Registry tag this client serves, e.g. `"slack"`.
    fn channel_type(&self) -> &'static str;

    async fn send(&self, message: &Message, config: &ChannelConfig) -> Result<(), NotifyError>;
}

pub(crate) fn mismatched_config(expected: &str, config: &ChannelConfig) -> NotifyError {
    NotifyError::malformed(format!(
        "{expected} client received {} channel configuration",
        config.channel_type()
    ))
}
