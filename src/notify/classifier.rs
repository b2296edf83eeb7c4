use crate::notify::error::{FailureKind, NotifyError};

/// Decides whether a transport failure is worth retrying.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, err: &NotifyError) -> FailureKind;
}

/// Classifier for the shared [`NotifyError`] taxonomy.
///
/// Channels translate their wire-level failures (HTTP status, Slack API error
/// codes, SMTP replies) into taxonomy variants, so this mapping stays
/// channel-agnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorClassifier;

impl ErrorClassifier for DefaultErrorClassifier {
    fn classify(&self, err: &NotifyError) -> FailureKind {
        match err {
            NotifyError::TransportTimeout { .. }
            | NotifyError::RateLimited { .. }
            | NotifyError::ServerUnavailable { .. }
            | NotifyError::ConnectionFailed { .. }
            | NotifyError::Cancelled => FailureKind::Transient,
            NotifyError::UnsupportedChannel { .. }
            | NotifyError::AuthenticationRejected { .. }
            | NotifyError::MalformedConfiguration { .. }
            | NotifyError::Rejected { .. } => FailureKind::Permanent,
        }
    }
}
