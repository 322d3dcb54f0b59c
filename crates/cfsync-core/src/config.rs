//! Configuration types for cfsync
//!
//! A run is described by a [`SyncConfig`] (what to synchronize and how) and a
//! set of [`Credentials`] resolved from the command line, the environment and
//! the JSON config file, in that order of precedence.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that supplies the Cloudflare API token
pub const API_KEY_ENV: &str = "CF_API_KEY";

/// Contents of the JSON config file (`~/.cloudflare/config` by default)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Cloudflare account email
    #[serde(default)]
    pub email: Option<String>,

    /// Cloudflare API token
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ConfigFile {
    /// Load the config file at `path`.
    ///
    /// A missing file yields an empty config. A file that exists but cannot
    /// be read or is not valid JSON is a configuration error.
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!(
                "Error reading config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            crate::Error::config(format!(
                "Config file {} is not valid JSON: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Cloudflare credentials for a run
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Cloudflare account email
    pub email: String,
    /// Cloudflare API token
    pub api_key: String,
}

// Keep the token out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from their sources.
    ///
    /// Email: command line, then config file.
    /// API key: environment, then config file.
    /// Empty strings count as absent.
    pub fn resolve(
        cli_email: Option<String>,
        env_api_key: Option<String>,
        file: &ConfigFile,
    ) -> Result<Self, crate::Error> {
        let email = non_empty(cli_email).or_else(|| non_empty(file.email.clone()));
        let api_key = non_empty(env_api_key).or_else(|| non_empty(file.api_key.clone()));

        match (email, api_key) {
            (Some(email), Some(api_key)) => Ok(Self { email, api_key }),
            _ => Err(crate::Error::config(
                "Cloudflare email and API key are required. Provide them via arguments, \
                 environment variables, or in the config file.",
            )),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Email report settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// Report recipient
    pub to: String,
    /// Envelope sender; `root@<hostname>` when absent
    pub from: Option<String>,
}

/// Settings for a single synchronization run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Domain (zone name) whose records are synchronized
    pub domain: String,

    /// Interface to take the IPv6 address from; IPv6 sync is skipped without one
    pub interface: Option<String>,

    /// Create AAAA records for A-record names that have none
    pub add_aaaa: bool,

    /// Report intended mutations without applying them
    pub dry_run: bool,

    /// Send the report even when nothing changed
    pub force_report: bool,

    /// Email report settings
    pub mail: Option<MailConfig>,
}

impl SyncConfig {
    /// Create a new configuration for `domain` with everything else disabled
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            interface: None,
            add_aaaa: false,
            dry_run: false,
            force_report: false,
            mail: None,
        }
    }

    /// Set the IPv6 interface
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Enable or disable AAAA creation
    pub fn with_add_aaaa(mut self, add_aaaa: bool) -> Self {
        self.add_aaaa = add_aaaa;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Always send a report when a recipient is configured
    pub fn with_force_report(mut self, force_report: bool) -> Self {
        self.force_report = force_report;
        self
    }

    /// Set the email report settings
    pub fn with_mail(mut self, mail: MailConfig) -> Self {
        self.mail = Some(mail);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.domain)?;

        if let Some(interface) = &self.interface
            && interface.trim().is_empty()
        {
            return Err(crate::Error::config("Interface name cannot be empty"));
        }

        if let Some(mail) = &self.mail
            && !mail.to.contains('@')
        {
            return Err(crate::Error::config(format!(
                "Invalid report recipient: {}",
                mail.to
            )));
        }

        Ok(())
    }
}

/// Basic RFC 1035 domain name checks.
fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
