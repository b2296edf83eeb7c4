use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as EmailMessage, Tokio1Executor};
use tracing::debug;

use crate::config::schema::{ChannelConfig, EMAIL_CHANNEL, EmailConfig};
use crate::notify::channel::{ChannelClient, mismatched_config};
use crate::notify::error::NotifyError;
use crate::notify::events::Message;

/// Sends alerts as plain-text mail through an SMTP relay (STARTTLS).
///
/// The transport is built per send because host and credentials come with
/// each call's configuration.
#[derive(Debug, Default)]
pub struct EmailChannelClient;

impl EmailChannelClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChannelClient for EmailChannelClient {
    fn channel_type(&self) -> &'static str {
        EMAIL_CHANNEL
    }

    async fn send(&self, message: &Message, config: &ChannelConfig) -> Result<(), NotifyError> {
        let ChannelConfig::Email(email) = config else {
            return Err(mismatched_config(EMAIL_CHANNEL, config));
        };

        let mail = build_email(message, email)?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&email.smtp_host)
            .map_err(|err| NotifyError::malformed(format!("smtp relay {}: {err}", email.smtp_host)))?
            .port(email.smtp_port)
            // Bounded by the dispatcher deadline.
            .timeout(None);
        if let (Some(username), Some(password)) = (&email.username, &email.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        builder.build().send(mail).await.map_err(smtp_error)?;

        debug!(
            channel = self.channel_type(),
            recipients = email.to.len(),
            "Email notification sent"
        );
        Ok(())
    }
}

fn build_email(message: &Message, config: &EmailConfig) -> Result<EmailMessage, NotifyError> {
    if config.to.is_empty() {
        return Err(NotifyError::malformed("email channel has no recipients"));
    }

    let from: Mailbox = config
        .from
        .parse()
        .map_err(|err| NotifyError::malformed(format!("invalid from address: {err}")))?;
    let mut builder = EmailMessage::builder()
        .from(from)
        .subject(message.title.clone())
        .message_id(Some(format!("<{}@schemanotify>", message.dedup_key)))
        .header(ContentType::TEXT_PLAIN);
    for recipient in &config.to {
        let to: Mailbox = recipient
            .parse()
            .map_err(|err| NotifyError::malformed(format!("invalid recipient {recipient}: {err}")))?;
        builder = builder.to(to);
    }

    builder
        .body(message.body.clone())
        .map_err(|err| NotifyError::malformed(format!("build email: {err}")))
}

fn smtp_error(err: lettre::transport::smtp::Error) -> NotifyError {
    let code = err
        .status()
        .and_then(|code| code.to_string().parse::<u16>().ok());
    smtp_failure(code, err.is_client(), err.to_string())
}

/// Maps an SMTP reply code, when the server sent one, onto the taxonomy.
fn smtp_failure(code: Option<u16>, is_client: bool, detail: String) -> NotifyError {
    match code {
        Some(status @ (530 | 534 | 535)) => NotifyError::AuthenticationRejected {
            status,
            body: detail,
        },
        Some(status @ 400..=499) => NotifyError::ServerUnavailable {
            status,
            body: detail,
        },
        Some(status @ 500..=599) => NotifyError::Rejected {
            status,
            body: detail,
        },
        _ if is_client => NotifyError::malformed(detail),
        _ => NotifyError::ConnectionFailed { message: detail },
    }
}
