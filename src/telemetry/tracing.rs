use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::schema::LoggingConfig;

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    pub json_format: bool,
    /// Set by `--debug`; wins over `RUST_LOG`.
    pub force_debug: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            force_debug: false,
        }
    }
}

impl TracingConfig {
    /// Builds the tracing setup from the `[logging]` section; `debug` forces debug level.
    pub fn from_logging(logging: &LoggingConfig, debug: bool) -> Result<Self, TracingError> {
        let level = if debug {
            Level::DEBUG
        } else {
            Level::from_str(logging.level.trim())
                .map_err(|_| TracingError::InvalidLevel(logging.level.clone()))?
        };
        Ok(Self {
            level,
            json_format: logging.json,
            force_debug: debug,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
}

/// Keeps the scoped subscriber installed for as long as it lives.
#[derive(Debug)]
pub struct TracingGuard {
    _default_guard: tracing::subscriber::DefaultGuard,
}

pub fn init_tracing(config: &TracingConfig) -> TracingGuard {
    let env_filter = resolve_env_filter(config);

    let default_guard = if config.json_format {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_timer(tracing_subscriber::fmt::time::SystemTime);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .set_default()
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_timer(tracing_subscriber::fmt::time::SystemTime);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .set_default()
    };

    TracingGuard {
        _default_guard: default_guard,
    }
}

fn resolve_env_filter(config: &TracingConfig) -> EnvFilter {
    if config.force_debug {
        EnvFilter::new(Level::DEBUG.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
    }
}
