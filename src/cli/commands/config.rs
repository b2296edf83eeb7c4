use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::config::{ChannelConfig, Config, ConfigError, load_config, validate_config};

pub fn handle_init(config_path: &Path, force: bool) -> anyhow::Result<()> {
    if config_path.exists() && !force && !confirm_overwrite(config_path)? {
        println!("Aborted.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
        set_dir_permissions(parent);
    }

    fs::write(config_path, generate_default_config_toml())?;
    set_file_permissions(config_path);

    println!("Config created at {}", config_path.display());
    Ok(())
}

pub fn handle_show(config_path: &Path) -> anyhow::Result<()> {
    if !config_path.exists() {
        eprintln!(
            "No config file at {}, showing defaults",
            config_path.display()
        );
    }
    let config = redact_secrets(load_config(config_path)?);
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

const SECRET_MASK: &str = "********";

/// Masks channel credentials before display.
fn redact_secrets(mut config: Config) -> Config {
    match config.notifications.channel.as_mut() {
        Some(ChannelConfig::Slack(slack)) => mask(slack.bot_token.as_mut()),
        Some(ChannelConfig::Webhook(webhook)) => {
            if let Some(headers) = webhook.headers.as_mut() {
                headers.values_mut().for_each(|value| mask(Some(value)));
            }
        }
        Some(ChannelConfig::Email(email)) => mask(email.password.as_mut()),
        Some(ChannelConfig::Other { .. }) | None => {}
    }
    config
}

fn mask(secret: Option<&mut String>) {
    if let Some(secret) = secret.filter(|secret| !secret.is_empty()) {
        *secret = SECRET_MASK.to_string();
    }
}

pub fn handle_validate(config_path: &Path) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!(
            "No config file found at {}, will use defaults",
            config_path.display()
        );
        return Ok(());
    }

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(err @ ConfigError::Parse { .. }) => {
            eprintln!("{err}");
            anyhow::bail!("Configuration invalid");
        }
        Err(err) => return Err(err.into()),
    };

    let result = validate_config(&config);
    for warning in &result.warnings {
        eprintln!("Warning: {}: {}", warning.field, warning.message);
    }
    for error in &result.errors {
        eprintln!("Error: {}: {}", error.field, error.message);
        if let Some(suggestion) = &error.suggestion {
            eprintln!("  Suggestion: {suggestion}");
        }
    }

    if !result.is_valid() {
        anyhow::bail!(
            "Configuration invalid ({} error(s))",
            result.errors.len()
        );
    }

    println!("Configuration valid");
    Ok(())
}

pub fn handle_path(config_path: &Path) {
    println!("{}", config_path.display());
}

fn confirm_overwrite(path: &Path) -> anyhow::Result<bool> {
    print!(
        "Config already exists at {}. Overwrite? [y/N] ",
        path.display()
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let response = input.trim();
    Ok(response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes"))
}

fn set_dir_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o700)) {
            eprintln!("Warning: failed to set directory permissions: {err}");
        }
    }
}

// Channel settings may carry tokens and SMTP passwords.
fn set_file_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
            eprintln!("Warning: failed to set config file permissions: {err}");
        }
    }
}

fn generate_default_config_toml() -> String {
    r##"# schemanotify configuration file

[logging]
# Log level: trace, debug, info, warn, error
level = "info"
# Emit JSON log lines
json = false

[dispatch]
# Upper bound for a single channel send (seconds)
timeout_secs = 10

[notifications]
# Which schema change categories are delivered
send_on_breaking = true
send_on_non_breaking = true

# Exactly one channel. Uncomment and fill in one of the blocks below.

# Slack incoming webhook
# [notifications.channel]
# type = "slack"
# webhook_url = "https://hooks.slack.com/services/T000/B000/XXXX"
# Or the Web API: set bot_token and channel instead of webhook_url
# bot_token = "xoxb-..."
# channel = "#data-alerts"

# Generic JSON webhook
# [notifications.channel]
# type = "webhook"
# url = "https://your-webhook.example.com/hook"
# headers = { "Authorization" = "Bearer token" }

# SMTP email (STARTTLS)
# [notifications.channel]
# type = "email"
# smtp_host = "smtp.example.com"
# smtp_port = 587
# username = "alerts"
# password = "secret"
# from = "Schema Alerts <alerts@example.com>"
# to = ["oncall@example.com"]
"##
    .to_string()
}
