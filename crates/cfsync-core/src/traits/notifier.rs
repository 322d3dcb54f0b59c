// # Notifier Trait
//
// Delivers the rendered run report to a human.
//
// ## Implementations
//
// - Local SMTP relay: `cfsync-notify-smtp` crate

use async_trait::async_trait;

/// A rendered report ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address
    pub recipient: String,
    /// Sender address; the notifier picks a default when absent
    pub from: Option<String>,
    /// Subject line
    pub subject: String,
    /// Plaintext body
    pub body: String,
}

/// Trait for report delivery
///
/// A failed delivery is returned as an error; the caller records it in the
/// run report instead of aborting.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    async fn send(&self, notification: &Notification) -> Result<(), crate::Error>;
}
