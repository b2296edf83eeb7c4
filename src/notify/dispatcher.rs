use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::schema::NotificationSettings;
use crate::notify::classifier::{DefaultErrorClassifier, ErrorClassifier};
use crate::notify::error::{FailureKind, NotifyError};
use crate::notify::events::SchemaChangeEvent;
use crate::notify::formatter::MessageFormatter;
use crate::notify::outcome::DeliveryResult;
use crate::notify::registry::ChannelRegistry;
use crate::telemetry::metrics::DeliveryMetrics;

/// Entry point invoked by the workflow engine for each schema change.
///
/// A dispatch keeps no memory of earlier attempts. Replaying the same event
/// re-renders the same message and may deliver a duplicate alert, which is
/// preferred over dropping one.
pub struct Dispatcher {
    registry: ChannelRegistry,
    classifier: Arc<dyn ErrorClassifier>,
    formatter: MessageFormatter,
    metrics: Option<Arc<DeliveryMetrics>>,
}

impl Dispatcher {
    pub fn new(registry: ChannelRegistry, classifier: Arc<dyn ErrorClassifier>) -> Self {
        Self {
            registry,
            classifier,
            formatter: MessageFormatter::new(),
            metrics: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            ChannelRegistry::with_defaults(),
            Arc::new(DefaultErrorClassifier),
        )
    }

    pub fn with_metrics(mut self, metrics: Arc<DeliveryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn dispatch(
        &self,
        event: &SchemaChangeEvent,
        settings: &NotificationSettings,
        timeout: Duration,
    ) -> DeliveryResult {
        self.dispatch_with_cancel(event, settings, timeout, &CancellationToken::new())
            .await
    }

    /// Like [`Dispatcher::dispatch`], aborting the send as soon as `cancel` fires.
    pub async fn dispatch_with_cancel(
        &self,
        event: &SchemaChangeEvent,
        settings: &NotificationSettings,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> DeliveryResult {
        let span = info_span!(
            "dispatch",
            attempt_id = %Uuid::new_v4(),
            connection_id = event.connection_id(),
            category = event.category(),
        );
        let result = self
            .run(event, settings, timeout, cancel)
            .instrument(span)
            .await;

        if let Some(metrics) = &self.metrics {
            metrics.record_result(&result);
        }
        result
    }

    async fn run(
        &self,
        event: &SchemaChangeEvent,
        settings: &NotificationSettings,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> DeliveryResult {
        if !settings.allows(event.is_breaking()) {
            debug!("Notifications disabled for this change category; skipping");
            return DeliveryResult::skipped(format!(
                "{} schema change notifications are disabled",
                event.category()
            ));
        }

        let Some(channel) = settings.channel.as_ref() else {
            return self.failure(
                NotifyError::malformed("no notification channel configured"),
                None,
            );
        };

        let client = match self.registry.resolve(channel.channel_type()) {
            Ok(client) => client,
            Err(err) => return self.failure(err, Some(channel.channel_type())),
        };

        let message = self.formatter.render(event);
        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NotifyError::Cancelled),
            sent = tokio::time::timeout(timeout, client.send(&message, channel)) => {
                sent.unwrap_or(Err(NotifyError::TransportTimeout { duration: timeout }))
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_send_duration(started.elapsed());
        }

        match outcome {
            Ok(()) => {
                info!(
                    channel = client.channel_type(),
                    severity = message.severity.as_str(),
                    "Schema change notification sent"
                );
                DeliveryResult::sent(client.channel_type())
            }
            Err(err) => self.failure(err, Some(client.channel_type())),
        }
    }

    fn failure(&self, err: NotifyError, channel: Option<&str>) -> DeliveryResult {
        let kind = match self.classifier.classify(&err) {
            // A failure must stay actionable for the engine.
            FailureKind::None => FailureKind::Permanent,
            kind => kind,
        };

        match kind {
            FailureKind::Transient => warn!(
                channel = channel.unwrap_or("none"),
                error = %err,
                error_type = err.error_label(),
                failure_kind = kind.as_str(),
                "Notification delivery failed; retryable"
            ),
            _ => error!(
                channel = channel.unwrap_or("none"),
                error = %err,
                error_type = err.error_label(),
                failure_kind = kind.as_str(),
                "Notification delivery failed permanently; check channel configuration"
            ),
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_error(err.error_label());
        }

        let result = DeliveryResult::failed(kind, err.to_string());
        match channel {
            Some(channel) => result.with_channel(channel),
            None => result,
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ChannelConfig, SlackConfig};
    use crate::notify::channel::ChannelClient;
    use crate::notify::events::Message;
    use crate::notify::outcome::DeliveryStatus;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Succeed,
        Fail(fn() -> NotifyError),
        Hang,
    }

    struct MockChannel {
        calls: AtomicUsize,
        messages: Mutex<Vec<Message>>,
        behaviour: Behaviour,
    }

    impl MockChannel {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                messages: Mutex::new(Vec::new()),
                behaviour,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChannelClient for MockChannel {
        fn channel_type(&self) -> &'static str {
            "slack"
        }

        async fn send(&self, message: &Message, _config: &ChannelConfig) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.messages.lock().unwrap().push(message.clone());
            match self.behaviour {
                Behaviour::Succeed => Ok(()),
                Behaviour::Fail(make) => Err(make()),
                Behaviour::Hang => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
            }
        }
    }

    fn dispatcher(channel: Arc<MockChannel>) -> Dispatcher {
        let mut registry = ChannelRegistry::new();
        registry.register(channel);
        Dispatcher::new(registry, Arc::new(DefaultErrorClassifier))
    }

    fn event(is_breaking: bool) -> SchemaChangeEvent {
        let timestamp = chrono::Utc
            .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");
        SchemaChangeEvent::new("c1", is_breaking, timestamp, "https://x/y")
    }

    fn slack_settings() -> NotificationSettings {
        NotificationSettings::new(ChannelConfig::Slack(SlackConfig::webhook("https://hooks/abc")))
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn suppressed_category_is_skipped_without_transport_call() {
        let channel = MockChannel::new(Behaviour::Succeed);
        let dispatcher = dispatcher(channel.clone());
        let settings = NotificationSettings::breaking_only(ChannelConfig::Slack(
            SlackConfig::webhook("https://hooks/abc"),
        ));

        let result = dispatcher.dispatch(&event(false), &settings, TIMEOUT).await;

        assert_eq!(result.status, DeliveryStatus::Skipped);
        assert_eq!(result.failure_kind, FailureKind::None);
        assert_eq!(channel.calls(), 0);
    }

    #[tokio::test]
    async fn missing_channel_is_permanent_failure() {
        let channel = MockChannel::new(Behaviour::Succeed);
        let dispatcher = dispatcher(channel.clone());

        let result = dispatcher
            .dispatch(&event(true), &NotificationSettings::default(), TIMEOUT)
            .await;

        assert_eq!(result.status, DeliveryStatus::Failed);
        assert_eq!(result.failure_kind, FailureKind::Permanent);
        assert!(result.detail.contains("no notification channel configured"));
        assert_eq!(channel.calls(), 0);
    }

    #[tokio::test]
    async fn unregistered_channel_is_permanent_failure() {
        let channel = MockChannel::new(Behaviour::Succeed);
        let dispatcher = dispatcher(channel.clone());
        let settings = NotificationSettings::new(ChannelConfig::other("PagerDuty"));

        let result = dispatcher.dispatch(&event(true), &settings, TIMEOUT).await;

        assert_eq!(result.status, DeliveryStatus::Failed);
        assert_eq!(result.failure_kind, FailureKind::Permanent);
        assert_eq!(result.channel.as_deref(), Some("PagerDuty"));
        assert_eq!(channel.calls(), 0);
    }

    #[tokio::test]
    async fn repeated_dispatch_sends_identical_messages() {
        let channel = MockChannel::new(Behaviour::Succeed);
        let dispatcher = dispatcher(channel.clone());

        let first = dispatcher.dispatch(&event(true), &slack_settings(), TIMEOUT).await;
        let second = dispatcher.dispatch(&event(true), &slack_settings(), TIMEOUT).await;

        assert!(first.is_sent());
        assert!(second.is_sent());
        assert_eq!(channel.calls(), 2);
        let messages = channel.messages.lock().unwrap();
        assert_eq!(messages[0], messages[1]);
    }

    #[tokio::test]
    async fn classified_failures_carry_detail() {
        let channel = MockChannel::new(Behaviour::Fail(|| NotifyError::AuthenticationRejected {
            status: 401,
            body: "invalid_token".to_string(),
        }));
        let dispatcher = dispatcher(channel.clone());

        let result = dispatcher.dispatch(&event(true), &slack_settings(), TIMEOUT).await;

        assert_eq!(result.failure_kind, FailureKind::Permanent);
        assert!(result.detail.contains("invalid_token"));
        assert_eq!(result.channel.as_deref(), Some("slack"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_send_times_out_as_transient() {
        let channel = MockChannel::new(Behaviour::Hang);
        let dispatcher = dispatcher(channel.clone());

        let result = dispatcher
            .dispatch(&event(true), &slack_settings(), Duration::from_secs(3))
            .await;

        assert_eq!(result.status, DeliveryStatus::Failed);
        assert_eq!(result.failure_kind, FailureKind::Transient);
        assert!(result.detail.contains("timed out after 3s"));
        assert_eq!(channel.calls(), 1);
    }

    #[tokio::test]
    async fn cancelled_dispatch_is_transient() {
        let channel = MockChannel::new(Behaviour::Hang);
        let dispatcher = dispatcher(channel.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = dispatcher
            .dispatch_with_cancel(&event(true), &slack_settings(), TIMEOUT, &cancel)
            .await;

        assert_eq!(result.failure_kind, FailureKind::Transient);
        assert!(result.should_retry());
    }

    #[tokio::test]
    async fn classifier_without_verdict_is_treated_as_permanent() {
        struct Undecided;
        impl ErrorClassifier for Undecided {
            fn classify(&self, _err: &NotifyError) -> FailureKind {
                FailureKind::None
            }
        }

        let mut registry = ChannelRegistry::new();
        registry.register(MockChannel::new(Behaviour::Fail(|| NotifyError::Cancelled)));
        let dispatcher = Dispatcher::new(registry, Arc::new(Undecided));

        let result = dispatcher.dispatch(&event(true), &slack_settings(), TIMEOUT).await;
        assert_eq!(result.failure_kind, FailureKind::Permanent);
    }

    #[tokio::test]
    async fn metrics_record_each_outcome() {
        let metrics = Arc::new(DeliveryMetrics::new());
        let channel = MockChannel::new(Behaviour::Succeed);
        let dispatcher = dispatcher(channel).with_metrics(metrics.clone());

        dispatcher.dispatch(&event(true), &slack_settings(), TIMEOUT).await;
        dispatcher
            .dispatch(&event(true), &NotificationSettings::new(ChannelConfig::other("sms")), TIMEOUT)
            .await;

        let output = metrics.encode().unwrap();
        assert!(output.contains("status=\"sent\""));
        assert!(output.contains("schemanotify_delivery_errors_total{error=\"unsupported_channel\"} 1"));
    }
}
