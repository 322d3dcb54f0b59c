// # DNS Provider Trait
//
// Defines the interface to the authoritative DNS provider.
//
// ## Implementations
//
// - Cloudflare: `cfsync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfsync_core::{DnsProvider, RecordType};
//
// #[tokio::main]
// async fn main() -> cfsync_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.verify_credentials().await?;
//     let zone = provider.resolve_zone("example.com").await?;
//     for record in provider.list_records(&zone, RecordType::A).await? {
//         println!("{} -> {}", record.name, record.content);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// DNS record type managed by cfsync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque provider-side zone identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a DNS record as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-owned record identifier
    pub id: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Fully-qualified hostname
    pub name: String,
    /// Record content (an IP address for A/AAAA)
    pub content: String,
    /// Time-to-live in seconds (1 = automatic)
    pub ttl: u32,
    /// Whether traffic is proxied by the provider
    #[serde(default)]
    pub proxied: bool,
}

/// Desired state of a record, as sent on update or create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordData {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

/// Trait for DNS provider implementations
///
/// Every call is a single request against the provider API. Implementations
/// must not retry, cache zone or record identifiers, or decide whether a
/// mutation is needed: the [`SyncEngine`](crate::engine::SyncEngine) owns
/// those decisions, including skipping mutations in dry-run mode.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check that the configured credentials are valid and active
    async fn verify_credentials(&self) -> Result<(), crate::Error>;

    /// Look up the zone identifier for `domain`
    ///
    /// Returns `Error::NotFound` if no zone matches.
    async fn resolve_zone(&self, domain: &str) -> Result<ZoneId, crate::Error>;

    /// List all records of `record_type` in `zone`, in provider order
    async fn list_records(
        &self,
        zone: &ZoneId,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Replace the record `record_id` with `data`
    async fn update_record(
        &self,
        zone: &ZoneId,
        record_id: &str,
        data: &RecordData,
    ) -> Result<(), crate::Error>;

    /// Create a new record in `zone`
    async fn create_record(&self, zone: &ZoneId, data: &RecordData) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
