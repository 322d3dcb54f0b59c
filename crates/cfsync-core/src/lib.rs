// # cfsync-core
//
// Core library for the cfsync dynamic DNS synchronizer.
//
// ## Architecture Overview
//
// A run discovers the host's addresses, compares them against the records
// the DNS provider holds for one zone, and applies the difference:
// - **IpSource**: Trait for discovering the current IPv4/IPv6 address
// - **DnsProvider**: Trait for reading and mutating records via the provider API
// - **Notifier**: Trait for delivering the run report
// - **AddressResolver**: Combines IP sources into the run's desired addresses
// - **SyncEngine**: Runs the credential → address → zone → diff → apply flow
// - **RunReport**: Ordered changes and errors, rendered as a plaintext summary
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decisions live here, I/O lives in the plugin crates
// 2. **Sequential**: One run, one request at a time, no retries
// 3. **Explicit Failure**: Fatal errors are values returned to the caller, never process exits

pub mod traits;
pub mod engine;
pub mod resolver;
pub mod report;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsRecord, IpSource, Notifier, RecordData, RecordType, ZoneId};
pub use engine::{PlannedChange, RunOutcome, SyncEngine, plan};
pub use resolver::{AddressResolver, ResolvedAddresses};
pub use report::RunReport;
pub use config::{ConfigFile, Credentials, MailConfig, SyncConfig};
pub use error::{Error, Result};
