//! Core traits for cfsync
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current IPv4/IPv6 address
//! - [`DnsProvider`]: Read and mutate records via the provider API
//! - [`Notifier`]: Deliver the run report

pub mod ip_source;
pub mod dns_provider;
pub mod notifier;

pub use ip_source::{IpSource, IpVersion};
pub use dns_provider::{DnsProvider, DnsRecord, RecordData, RecordType, ZoneId};
pub use notifier::{Notification, Notifier};
