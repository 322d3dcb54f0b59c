// # SMTP Notifier
//
// Delivers the run report through an SMTP relay, by default the local MTA
// on `localhost:25`.
//
// ## Behavior
//
// - Plaintext body, no TLS, no authentication
// - One connection per report, 10 second timeout
// - Sender defaults to `root@<hostname>`
// - A refused connection gets a dedicated message, since it nearly always
//   means no local mail server is running

use cfsync_core::traits::{Notification, Notifier};
use cfsync_core::{Error, Result};

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use std::time::Duration;

/// Display name used in the From header
const SENDER_NAME: &str = "Cloudflare DNS Updater";

/// SMTP timeout per connection
const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECTION_REFUSED: &str = "Failed to connect to local SMTP server. Is it running?";

/// Report delivery via SMTP
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    default_from: String,
}

impl SmtpNotifier {
    /// Notifier for the relay on `localhost:25`
    pub fn new() -> Self {
        Self::with_server("localhost", 25)
    }

    /// Notifier for a specific relay
    pub fn with_server(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            default_from: default_sender(),
        }
    }

    fn build_message(&self, notification: &Notification) -> Result<Message> {
        let from = notification.from.as_deref().unwrap_or(&self.default_from);

        let from: Address = from
            .parse()
            .map_err(|e| send_error(format!("invalid sender {:?}: {}", from, e)))?;
        let to: Address = notification
            .recipient
            .parse()
            .map_err(|e| send_error(format!("invalid recipient {:?}: {}", notification.recipient, e)))?;

        Message::builder()
            .from(Mailbox::new(Some(SENDER_NAME.to_string()), from))
            .to(Mailbox::new(None, to))
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(send_error)
    }
}

impl Default for SmtpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// `root@<hostname>`, falling back to `root@localhost`
fn default_sender() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("root@{}", host)
}

fn send_error(cause: impl std::fmt::Display) -> Error {
    Error::notify(format!("Error sending email: {}", cause))
}

/// Walk the error chain looking for a refused TCP connection
fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::ConnectionRefused
        {
            return true;
        }
        current = e.source();
    }
    false
}

#[async_trait::async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let message = self.build_message(notification)?;

        tracing::debug!(
            "Sending email via {}:{}: envelope {:?}",
            self.host,
            self.port,
            message.envelope()
        );
        tracing::debug!("Email body:\n{}", notification.body);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
            .port(self.port)
            .timeout(Some(DEFAULT_SMTP_TIMEOUT))
            .build();

        match transport.send(message).await {
            Ok(_) => {
                tracing::info!("Email sent to {}", notification.recipient);
                Ok(())
            }
            Err(e) if is_connection_refused(&e) => Err(Error::notify(CONNECTION_REFUSED)),
            Err(e) => Err(send_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(from: Option<&str>) -> Notification {
        Notification {
            recipient: "ops@example.com".to_string(),
            from: from.map(str::to_string),
            subject: "DNS Update for example.com".to_string(),
            body: "No changes were necessary.".to_string(),
        }
    }

    #[test]
    fn test_default_sender_is_root_at_host() {
        let notifier = SmtpNotifier::new();
        assert!(notifier.default_from.starts_with("root@"));
        assert!(notifier.default_from.len() > "root@".len());
    }

    #[test]
    fn test_message_uses_explicit_sender() {
        let notifier = SmtpNotifier::new();
        let message = notifier
            .build_message(&notification(Some("ddns@example.com")))
            .unwrap();

        let envelope = message.envelope();
        assert_eq!(
            envelope.from().map(|a| a.to_string()).as_deref(),
            Some("ddns@example.com")
        );
        assert_eq!(envelope.to()[0].to_string(), "ops@example.com");
    }

    #[test]
    fn test_invalid_recipient_is_error() {
        let notifier = SmtpNotifier::new();
        let mut bad = notification(None);
        bad.recipient = "not-an-address".to_string();

        let err = notifier.build_message(&bad).unwrap_err();
        assert!(err.detail().starts_with("Error sending email:"));
    }

    #[test]
    fn test_refused_connection_detected_in_chain() {
        let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(is_connection_refused(&io));

        let other = std::io::Error::from(std::io::ErrorKind::TimedOut);
        assert!(!is_connection_refused(&other));
    }
}
