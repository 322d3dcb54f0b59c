//! Run report
//!
//! Collects the changes and errors of a single run and renders the
//! plaintext summary that is logged and optionally emailed.

use crate::config::{MailConfig, SyncConfig};
use crate::resolver::ResolvedAddresses;
use crate::traits::{Notification, Notifier};
use chrono::{DateTime, Local};
use tracing::{debug, error, info};

/// Accumulated outcome of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    domain: String,
    interface: Option<String>,
    dry_run: bool,
    started_at: DateTime<Local>,
    addresses: ResolvedAddresses,
    changes: Vec<String>,
    errors: Vec<String>,
}

impl RunReport {
    /// Start a report for the run described by `config`
    pub fn new(config: &SyncConfig) -> Self {
        Self::started_at(config, Local::now())
    }

    /// Start a report with an explicit start time
    pub fn started_at(config: &SyncConfig, started_at: DateTime<Local>) -> Self {
        Self {
            domain: config.domain.clone(),
            interface: config.interface.clone(),
            dry_run: config.dry_run,
            started_at,
            addresses: ResolvedAddresses::default(),
            changes: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Append a change entry
    pub fn record_change(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.changes.push(message);
    }

    /// Append an error entry
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.errors.push(message);
    }

    pub(crate) fn set_addresses(&mut self, addresses: ResolvedAddresses) {
        self.addresses = addresses;
    }

    pub fn changes(&self) -> &[String] {
        &self.changes
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn addresses(&self) -> ResolvedAddresses {
        self.addresses
    }

    /// Whether a report should be sent: something changed, something failed,
    /// or the caller forces it.
    pub fn should_notify(&self, force: bool) -> bool {
        !self.changes.is_empty() || !self.errors.is_empty() || force
    }

    /// Subject line for the emailed report
    pub fn subject(&self) -> String {
        let mut subject = format!("DNS Update for {}", self.domain);
        if !self.errors.is_empty() {
            subject.push_str(" [ERROR]");
        } else if !self.changes.is_empty() {
            subject.push_str(" [UPDATED]");
        }
        subject
    }

    /// Render the plaintext report
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        if self.dry_run {
            lines.push("*** DRY RUN MODE - NO CHANGES WERE MADE ***".to_string());
            lines.push(String::new());
        }

        lines.push(format!("DNS Update for {}", self.domain));
        lines.push(format!("Time: {}", self.started_at.format("%Y-%m-%d %H:%M")));
        lines.push(String::new());

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            lines.extend(self.errors.iter().map(|e| format!("• {}", e)));
            lines.push(String::new());
        }

        lines.push("IP Addresses:".to_string());
        lines.push(format!(
            "• IPv4: {}",
            self.addresses
                .ipv4
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "Not available".to_string())
        ));
        if let Some(interface) = &self.interface {
            lines.push(format!(
                "• IPv6: {} (Interface: {})",
                self.addresses
                    .ipv6
                    .map(|ip| ip.to_string())
                    .unwrap_or_else(|| "Not found".to_string()),
                interface
            ));
        }
        lines.push(String::new());

        if !self.changes.is_empty() {
            lines.push("Changes Made:".to_string());
            lines.extend(self.changes.iter().map(|c| format!("• {}", c)));
        } else if self.errors.is_empty() {
            lines.push("No changes were necessary.".to_string());
        }

        lines.join("\n")
    }

    /// Email the report. Delivery failure is recorded as a run error and
    /// never propagated.
    pub async fn notify(&mut self, notifier: &dyn Notifier, mail: &MailConfig) {
        let notification = Notification {
            recipient: mail.to.clone(),
            from: mail.from.clone(),
            subject: self.subject(),
            body: self.render(),
        };

        debug!("Sending report to {}: {}", notification.recipient, notification.subject);
        match notifier.send(&notification).await {
            Ok(()) => debug!("Report sent to {}", notification.recipient),
            Err(e) => self.record_error(e.detail()),
        }
    }
}
