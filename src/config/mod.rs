//! Configuration management module.

pub mod loader;
pub mod paths;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, load_config, parse_config};
pub use paths::{CONFIG_ENV, Paths};
pub use schema::{
    ChannelConfig, Config, DispatchConfig, EMAIL_CHANNEL, EmailConfig, LoggingConfig,
    NotificationSettings, SLACK_CHANNEL, SlackConfig, WEBHOOK_CHANNEL, WebhookConfig,
};
pub use validation::{ValidationError, ValidationResult, ValidationWarning, validate_config};
