use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cli::app::EventArgs;
use crate::config::load_config;
use crate::notify::{Dispatcher, DeliveryResult, DeliveryStatus, FailureKind};
use crate::telemetry::{DeliveryMetrics, TracingConfig, init_tracing};

/// sysexits.h `EX_TEMPFAIL`: the caller should try again later.
pub const EXIT_TRANSIENT: u8 = 75;
pub const EXIT_PERMANENT: u8 = 1;

pub async fn handle_send(
    config_path: &Path,
    event: &EventArgs,
    timeout_secs: Option<u64>,
    json: bool,
    debug: bool,
) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;
    let tracing_config = TracingConfig::from_logging(&config.logging, debug)?;
    let _guard = init_tracing(&tracing_config);

    let timeout = Duration::from_secs(timeout_secs.unwrap_or(config.dispatch.timeout_secs));
    if timeout.is_zero() {
        anyhow::bail!("Send timeout must be positive");
    }

    let metrics = Arc::new(DeliveryMetrics::new());
    let dispatcher = Dispatcher::with_defaults().with_metrics(Arc::clone(&metrics));
    let result = dispatcher
        .dispatch(&event.to_event(), &config.notifications, timeout)
        .await;

    if let Ok(encoded) = metrics.encode() {
        debug!(metrics = %encoded, "Dispatch metrics");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", describe(&result));
    }

    Ok(ExitCode::from(exit_code(&result)))
}

pub fn exit_code(result: &DeliveryResult) -> u8 {
    match (result.status, result.failure_kind) {
        (DeliveryStatus::Sent | DeliveryStatus::Skipped, _) => 0,
        (DeliveryStatus::Failed, FailureKind::Transient) => EXIT_TRANSIENT,
        (DeliveryStatus::Failed, _) => EXIT_PERMANENT,
    }
}

fn describe(result: &DeliveryResult) -> String {
    let channel = result.channel.as_deref().unwrap_or("none");
    match result.status {
        DeliveryStatus::Sent => format!("Sent via {channel}"),
        DeliveryStatus::Skipped => format!("Skipped: {}", result.detail),
        DeliveryStatus::Failed => format!(
            "Failed ({}) via {channel}: {}",
            result.failure_kind.as_str(),
            result.detail
        ),
    }
}
