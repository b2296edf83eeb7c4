use std::sync::{Arc, Mutex};
use std::time::Duration;

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

use crate::notify::outcome::DeliveryResult;

const METRICS_NAMESPACE: &str = "schemanotify";
const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct InfoLabels {
    version: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct DeliveryLabels {
    channel: String,
    status: String,
    failure_kind: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ErrorLabels {
    error: String,
}

/// Prometheus counters for dispatch outcomes.
#[derive(Clone)]
pub struct DeliveryMetrics {
    registry: Arc<Mutex<Registry>>,
    deliveries_total: Family<DeliveryLabels, Counter>,
    delivery_errors_total: Family<ErrorLabels, Counter>,
    send_duration_seconds: Histogram,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let info = Family::<InfoLabels, Gauge>::default();
        registry.register(
            format!("{METRICS_NAMESPACE}_info"),
            "Information about the schemanotify build",
            info.clone(),
        );

        let deliveries_total = Family::<DeliveryLabels, Counter>::default();
        registry.register(
            format!("{METRICS_NAMESPACE}_deliveries"),
            "Dispatch attempts by channel, status and failure kind",
            deliveries_total.clone(),
        );

        let delivery_errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            format!("{METRICS_NAMESPACE}_delivery_errors"),
            "Failed dispatch attempts by error label",
            delivery_errors_total.clone(),
        );

        let send_duration_seconds = Histogram::new([0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]);
        registry.register(
            format!("{METRICS_NAMESPACE}_send_duration_seconds"),
            "Time spent in channel sends",
            send_duration_seconds.clone(),
        );

        info.get_or_create(&InfoLabels {
            version: BUILD_VERSION.to_string(),
        })
        .set(1);

        Self {
            registry: Arc::new(Mutex::new(registry)),
            deliveries_total,
            delivery_errors_total,
            send_duration_seconds,
        }
    }

    pub fn record_result(&self, result: &DeliveryResult) {
        self.deliveries_total
            .get_or_create(&DeliveryLabels {
                channel: result.channel.clone().unwrap_or_else(|| "none".to_string()),
                status: result.status.as_str().to_string(),
                failure_kind: result.failure_kind.as_str().to_string(),
            })
            .inc();
    }

    /// Records a failed send under the error's stable label.
    pub fn record_error(&self, error_label: &str) {
        self.delivery_errors_total
            .get_or_create(&ErrorLabels {
                error: error_label.to_string(),
            })
            .inc();
    }

    pub fn record_send_duration(&self, duration: Duration) {
        self.send_duration_seconds.observe(duration.as_secs_f64());
    }

    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let registry = self.registry.lock().map_err(|_| std::fmt::Error)?;
        let mut buffer = String::new();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }
}

impl Default for DeliveryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::error::FailureKind;

    #[test]
    fn encode_contains_expected_families() {
        let metrics = DeliveryMetrics::new();
        let output = metrics.encode().expect("encode metrics");

        assert!(output.contains("# TYPE schemanotify_info gauge"));
        assert!(output.contains("schemanotify_info{version=\""));
        assert!(output.contains("# TYPE schemanotify_send_duration_seconds histogram"));
    }

    #[test]
    fn delivery_family_appears_once_recorded() {
        let metrics = DeliveryMetrics::new();
        metrics.record_result(&DeliveryResult::skipped("disabled"));

        let output = metrics.encode().expect("encode metrics");
        assert!(output.contains("# TYPE schemanotify_deliveries counter"));
        assert!(output.contains("channel=\"none\""));
    }

    #[test]
    fn record_result_counts_by_labels() {
        let metrics = DeliveryMetrics::new();
        metrics.record_result(&DeliveryResult::sent("slack"));
        metrics.record_result(&DeliveryResult::sent("slack"));
        metrics.record_result(
            &DeliveryResult::failed(FailureKind::Transient, "429").with_channel("slack"),
        );
        metrics.record_error("rate_limited");

        let output = metrics.encode().expect("encode metrics");
        let sent_line = output
            .lines()
            .find(|line| {
                line.starts_with("schemanotify_deliveries_total{")
                    && line.contains("status=\"sent\"")
            })
            .expect("sent series");
        assert!(sent_line.contains("channel=\"slack\""));
        assert!(sent_line.ends_with(" 2"));
        assert!(output.contains("failure_kind=\"transient\""));
        assert!(output.contains("schemanotify_delivery_errors_total{error=\"rate_limited\"} 1"));
    }

    #[test]
    fn send_duration_is_observed() {
        let metrics = DeliveryMetrics::new();
        metrics.record_send_duration(Duration::from_millis(120));

        let output = metrics.encode().expect("encode metrics");
        assert!(output.contains("schemanotify_send_duration_seconds_count 1"));
    }
}
