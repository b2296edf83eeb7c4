use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;

use crate::notify::channel::ChannelClient;
use crate::notify::email::EmailChannelClient;
use crate::notify::error::NotifyError;
use crate::notify::http::build_client;
use crate::notify::slack::SlackChannelClient;
use crate::notify::webhook::WebhookChannelClient;

/// Maps channel type tags to shared [`ChannelClient`] handles.
///
/// Adding a channel means implementing the trait and registering it here;
/// the dispatcher never names concrete clients.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    clients: HashMap<String, Arc<dyn ChannelClient>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Slack, webhook and email clients.
    pub fn with_defaults() -> Self {
        Self::with_http_client(build_client())
    }

    /// Built-in clients sharing the given HTTP connection pool.
    pub fn with_http_client(client: Client) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SlackChannelClient::new(client.clone())));
        registry.register(Arc::new(WebhookChannelClient::new(client)));
        registry.register(Arc::new(EmailChannelClient::new()));
        registry
    }

    /// Registers `client` under its own channel type, replacing any previous entry.
    pub fn register(&mut self, client: Arc<dyn ChannelClient>) -> &mut Self {
        self.clients
            .insert(client.channel_type().to_ascii_lowercase(), client);
        self
    }

    pub fn resolve(&self, channel_type: &str) -> Result<Arc<dyn ChannelClient>, NotifyError> {
        self.clients
            .get(&channel_type.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| NotifyError::UnsupportedChannel {
                channel_type: channel_type.to_string(),
            })
    }

    pub fn channel_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channel_types", &self.channel_types())
            .finish()
    }
}
