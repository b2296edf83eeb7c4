use crate::config::schema::{ChannelConfig, Config, EmailConfig, SlackConfig, WebhookConfig};

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

pub fn validate_config(config: &Config) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    validate_log_level(&config.logging.level, &mut errors);

    if config.dispatch.timeout_secs == 0 {
        errors.push(ValidationError {
            field: "dispatch.timeout_secs".to_string(),
            message: "Dispatch timeout must be positive".to_string(),
            suggestion: Some("Use a value of at least 1 second".to_string()),
        });
    }

    let notifications = &config.notifications;
    if !notifications.send_on_breaking && !notifications.send_on_non_breaking {
        warnings.push(ValidationWarning {
            field: "notifications".to_string(),
            message: "Both change categories are suppressed; every dispatch will be skipped"
                .to_string(),
        });
    }

    match notifications.channel {
        None => warnings.push(ValidationWarning {
            field: "notifications.channel".to_string(),
            message: "No channel configured; dispatches will fail until one is added".to_string(),
        }),
        Some(ChannelConfig::Slack(ref slack)) => validate_slack(slack, &mut errors, &mut warnings),
        Some(ChannelConfig::Webhook(ref webhook)) => validate_webhook(webhook, &mut errors),
        Some(ChannelConfig::Email(ref email)) => validate_email(email, &mut errors),
        Some(ChannelConfig::Other {
            ref channel_type, ..
        }) => errors.push(ValidationError {
            field: "notifications.channel.type".to_string(),
            message: format!("Unsupported channel type: {channel_type}"),
            suggestion: Some("Valid types: slack, webhook, email".to_string()),
        }),
    }

    ValidationResult { errors, warnings }
}

fn validate_slack(
    slack: &SlackConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    if slack.bot_token.is_some() && slack.channel.is_none() {
        warnings.push(ValidationWarning {
            field: "notifications.channel.bot_token".to_string(),
            message: "bot_token is ignored without a channel; the webhook URL is used".to_string(),
        });
    }

    if slack.bot_credentials().is_some() {
        return;
    }

    if slack.webhook_url.trim().is_empty() {
        errors.push(ValidationError {
            field: "notifications.channel.webhook_url".to_string(),
            message: "Slack webhook URL cannot be empty".to_string(),
            suggestion: Some("Set webhook_url, or bot_token together with channel".to_string()),
        });
    } else if !is_http_url(&slack.webhook_url) {
        errors.push(ValidationError {
            field: "notifications.channel.webhook_url".to_string(),
            message: "Slack webhook URL must start with http:// or https://".to_string(),
            suggestion: None,
        });
    }
}

fn validate_webhook(webhook: &WebhookConfig, errors: &mut Vec<ValidationError>) {
    if !is_http_url(&webhook.url) {
        errors.push(ValidationError {
            field: "notifications.channel.url".to_string(),
            message: "Webhook URL must start with http:// or https://".to_string(),
            suggestion: None,
        });
    }
}

fn validate_email(email: &EmailConfig, errors: &mut Vec<ValidationError>) {
    if email.smtp_host.trim().is_empty() {
        errors.push(ValidationError {
            field: "notifications.channel.smtp_host".to_string(),
            message: "SMTP host cannot be empty".to_string(),
            suggestion: None,
        });
    }

    if email.to.is_empty() {
        errors.push(ValidationError {
            field: "notifications.channel.to".to_string(),
            message: "Email channel needs at least one recipient".to_string(),
            suggestion: Some("Add an address to `to`".to_string()),
        });
    }

    if email.username.is_some() != email.password.is_some() {
        errors.push(ValidationError {
            field: "notifications.channel.username".to_string(),
            message: "SMTP username and password must be set together".to_string(),
            suggestion: None,
        });
    }
}

fn validate_log_level(level: &str, errors: &mut Vec<ValidationError>) {
    let level = level.trim().to_lowercase();
    let valid = ["trace", "debug", "info", "warn", "error"];
    if !valid.iter().any(|value| *value == level) {
        errors.push(ValidationError {
            field: "logging.level".to_string(),
            message: format!("Invalid log level: {level}"),
            suggestion: Some(format!("Valid levels: {}", valid.join(", "))),
        });
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::NotificationSettings;

    fn with_channel(channel: ChannelConfig) -> Config {
        Config {
            notifications: NotificationSettings::new(channel),
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_config_reports_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        let result = validate_config(&config);
        assert!(result.errors.iter().any(|err| err.field == "logging.level"));
    }

    #[test]
    fn test_validate_config_reports_zero_timeout() {
        let mut config = Config::default();
        config.dispatch.timeout_secs = 0;
        let result = validate_config(&config);
        assert!(
            result
                .errors
                .iter()
                .any(|err| err.field == "dispatch.timeout_secs")
        );
    }

    #[test]
    fn test_validate_config_warns_without_channel() {
        let result = validate_config(&Config::default());
        assert!(result.is_valid());
        assert!(
            result
                .warnings
                .iter()
                .any(|warning| warning.field == "notifications.channel")
        );
    }

    #[test]
    fn test_validate_config_reports_invalid_webhook_url() {
        let config = with_channel(ChannelConfig::Webhook(WebhookConfig {
            url: "ftp://example.com".to_string(),
            headers: None,
        }));
        let result = validate_config(&config);
        assert!(
            result
                .errors
                .iter()
                .any(|err| err.field == "notifications.channel.url")
        );
    }

    #[test]
    fn test_validate_config_accepts_slack_bot_mode_without_webhook() {
        let config = with_channel(ChannelConfig::Slack(SlackConfig {
            webhook_url: String::new(),
            bot_token: Some("xoxb-token".to_string()),
            channel: Some("C0123".to_string()),
        }));
        let result = validate_config(&config);
        assert!(result.is_valid(), "{:?}", result.errors);
    }

    #[test]
    fn test_validate_config_reports_empty_slack_webhook() {
        let config = with_channel(ChannelConfig::Slack(SlackConfig::webhook("  ")));
        let result = validate_config(&config);
        assert!(
            result
                .errors
                .iter()
                .any(|err| err.field == "notifications.channel.webhook_url")
        );
    }

    #[test]
    fn test_validate_config_reports_unsupported_channel() {
        let config = with_channel(ChannelConfig::other("PagerDuty"));
        let result = validate_config(&config);
        assert!(
            result
                .errors
                .iter()
                .any(|err| err.message.contains("PagerDuty"))
        );
    }

    #[test]
    fn test_validate_config_reports_email_without_recipients() {
        let config = with_channel(ChannelConfig::Email(EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: Some("user".to_string()),
            password: None,
            from: "alerts@example.com".to_string(),
            to: Vec::new(),
        }));
        let result = validate_config(&config);
        let fields: Vec<&str> = result.errors.iter().map(|err| err.field.as_str()).collect();
        assert!(fields.contains(&"notifications.channel.to"));
        assert!(fields.contains(&"notifications.channel.username"));
    }

    #[test]
    fn test_validate_config_warns_when_everything_suppressed() {
        let mut config = with_channel(ChannelConfig::Slack(SlackConfig::webhook("https://hooks/x")));
        config.notifications.send_on_breaking = false;
        config.notifications.send_on_non_breaking = false;
        let result = validate_config(&config);
        assert!(result.is_valid());
        assert!(
            result
                .warnings
                .iter()
                .any(|warning| warning.field == "notifications")
        );
    }
}
