//! Reconciliation engine
//!
//! The [`SyncEngine`] drives a single run:
//!
//! ```text
//! START → verify_credentials → resolve_addresses → resolve_zone
//!       → list_records(A) → list_records(AAAA) → diff_and_apply
//!       → [notify] → END
//!
//! any fatal step ──────────────────────────────→ FAILED → [notify] → END
//! ```
//!
//! Diffing is done by [`plan`], a pure function over already-fetched
//! records. The engine then applies each planned change in order and appends
//! its outcome (applied, simulated, or failed) to the [`RunReport`].
//!
//! ## Error Policy
//!
//! | Step | On failure |
//! |------|------------|
//! | credentials, IPv4, zone, listing | fatal: recorded, run aborted |
//! | IPv6 | recorded, IPv6 sync skipped |
//! | single update/create | recorded, next change applied |
//! | notification | recorded |

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::report::RunReport;
use crate::resolver::{AddressResolver, ResolvedAddresses};
use crate::traits::{DnsProvider, DnsRecord, Notifier, RecordData, RecordType, ZoneId};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A mutation decided by [`plan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedChange {
    /// Point an existing record at a new address, keeping its id, ttl and
    /// proxied flag
    Update {
        record: DnsRecord,
        new_content: String,
    },
    /// Create a new record
    Create { data: RecordData },
}

/// Compute the changes needed to bring `a_records` and `aaaa_records` in line
/// with `addresses`.
///
/// Order: A updates, AAAA updates, AAAA creations, each following the order
/// in which the records were listed.
pub fn plan(
    a_records: &[DnsRecord],
    aaaa_records: &[DnsRecord],
    addresses: &ResolvedAddresses,
    add_aaaa: bool,
) -> Vec<PlannedChange> {
    let mut changes = Vec::new();

    if let Some(ipv4) = addresses.ipv4 {
        let content = ipv4.to_string();
        changes.extend(
            a_records
                .iter()
                .filter(|record| record.content != content)
                .map(|record| PlannedChange::Update {
                    record: record.clone(),
                    new_content: content.clone(),
                }),
        );
    }

    let Some(ipv6) = addresses.ipv6 else {
        return changes;
    };
    let content = ipv6.to_string();

    changes.extend(
        aaaa_records
            .iter()
            .filter(|record| record.content != content)
            .map(|record| PlannedChange::Update {
                record: record.clone(),
                new_content: content.clone(),
            }),
    );

    if add_aaaa {
        let covered: HashSet<&str> = aaaa_records.iter().map(|r| r.name.as_str()).collect();
        changes.extend(
            a_records
                .iter()
                .filter(|record| !covered.contains(record.name.as_str()))
                .map(|record| PlannedChange::Create {
                    data: RecordData {
                        record_type: RecordType::Aaaa,
                        name: record.name.clone(),
                        content: content.clone(),
                        ttl: record.ttl,
                        proxied: record.proxied,
                    },
                }),
        );
    }

    changes
}

/// Result of a run
#[derive(Debug)]
pub struct RunOutcome {
    /// Everything recorded during the run
    pub report: RunReport,
    /// The error that aborted the run, if any
    pub fatal: Option<Error>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.fatal.is_none()
    }

    /// Outcome of a run that failed before a [`SyncEngine`] could be built,
    /// e.g. on missing credentials.
    ///
    /// The error is recorded and, when `config.mail` is set, the report is
    /// sent through `notifier`.
    pub async fn aborted(config: &SyncConfig, error: Error, notifier: &dyn Notifier) -> Self {
        let mut report = RunReport::new(config);
        report.record_error(error.detail());

        if let Some(mail) = &config.mail {
            report.notify(notifier, mail).await;
        }

        Self {
            report,
            fatal: Some(error),
        }
    }
}

/// Orchestrates one synchronization run
pub struct SyncEngine {
    provider: Box<dyn DnsProvider>,
    resolver: AddressResolver,
    notifier: Option<Box<dyn Notifier>>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// `notifier` is only used when `config.mail` is set.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        resolver: AddressResolver,
        notifier: Option<Box<dyn Notifier>>,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;

        if config.mail.is_some() && notifier.is_none() {
            return Err(Error::config("A report recipient is set but no notifier was provided"));
        }

        Ok(Self {
            provider,
            resolver,
            notifier,
            config,
        })
    }

    /// Run the full state machine.
    ///
    /// Never panics or exits; the caller decides the exit status from
    /// [`RunOutcome::fatal`].
    pub async fn run(&self) -> RunOutcome {
        let mut report = RunReport::new(&self.config);

        if self.config.dry_run {
            warn!("Running in DRY-RUN mode - no changes will be made");
        }

        let fatal = self.sync(&mut report).await.err();

        let send = match &fatal {
            None => report.should_notify(self.config.force_report),
            Some(_) => !report.errors().is_empty(),
        };

        if let (Some(mail), Some(notifier)) = (&self.config.mail, &self.notifier) {
            if send {
                report.notify(notifier.as_ref(), mail).await;
            } else {
                debug!("Nothing to report, skipping email");
            }
        }

        RunOutcome { report, fatal }
    }

    async fn sync(&self, report: &mut RunReport) -> Result<()> {
        self.verify_credentials(report).await?;

        let addresses = self.resolver.resolve(report).await?;

        let zone = self.resolve_zone(report).await?;

        let a_records = self.list_records(&zone, RecordType::A, report).await?;
        let aaaa_records = self.list_records(&zone, RecordType::Aaaa, report).await?;
        info!(
            "{} A records and {} AAAA records found.",
            a_records.len(),
            aaaa_records.len()
        );

        let changes = plan(&a_records, &aaaa_records, &addresses, self.config.add_aaaa);
        debug!("{} change(s) planned", changes.len());

        for change in &changes {
            self.apply(&zone, change, report).await;
        }

        info!("DNS update completed.");
        Ok(())
    }

    async fn verify_credentials(&self, report: &mut RunReport) -> Result<()> {
        debug!("Verifying credentials with {} provider", self.provider.provider_name());
        match self.provider.verify_credentials().await {
            Ok(()) => {
                info!("API token verified successfully.");
                Ok(())
            }
            Err(e) => {
                report.record_error(format!("API token verification failed: {}", e.detail()));
                Err(e)
            }
        }
    }

    async fn resolve_zone(&self, report: &mut RunReport) -> Result<ZoneId> {
        let domain = &self.config.domain;
        match self.provider.resolve_zone(domain).await {
            Ok(zone) => {
                info!("Retrieved Zone ID: {} for domain {}", zone, domain);
                Ok(zone)
            }
            Err(e @ Error::NotFound(_)) => {
                report.record_error(format!(
                    "Unable to fetch Zone ID for {}. Check your domain name and API credentials.",
                    domain
                ));
                Err(e)
            }
            Err(e) => {
                report.record_error(format!(
                    "Unable to fetch Zone ID for {}: {}",
                    domain,
                    e.detail()
                ));
                Err(e)
            }
        }
    }

    async fn list_records(
        &self,
        zone: &ZoneId,
        record_type: RecordType,
        report: &mut RunReport,
    ) -> Result<Vec<DnsRecord>> {
        self.provider
            .list_records(zone, record_type)
            .await
            .inspect_err(|e| {
                report.record_error(format!(
                    "Failed to list {} records: {}",
                    record_type,
                    e.detail()
                ))
            })
    }

    async fn apply(&self, zone: &ZoneId, change: &PlannedChange, report: &mut RunReport) {
        match change {
            PlannedChange::Update {
                record,
                new_content,
            } => {
                if self.config.dry_run {
                    report.record_change(format!(
                        "Would update {} record for {} from {} to {}",
                        record.record_type, record.name, record.content, new_content
                    ));
                    return;
                }

                let data = RecordData {
                    record_type: record.record_type,
                    name: record.name.clone(),
                    content: new_content.clone(),
                    ttl: record.ttl,
                    proxied: record.proxied,
                };

                match self.provider.update_record(zone, &record.id, &data).await {
                    Ok(()) => report.record_change(format!(
                        "Updating {} record for {} from {} to {}",
                        record.record_type, record.name, record.content, new_content
                    )),
                    Err(e) => report.record_error(format!(
                        "Failed to update {} record for {}: {}",
                        record.record_type,
                        record.name,
                        e.detail()
                    )),
                }
            }
            PlannedChange::Create { data } => {
                if self.config.dry_run {
                    report.record_change(format!(
                        "Would add {} record for {} with IP {}",
                        data.record_type, data.name, data.content
                    ));
                    return;
                }

                match self.provider.create_record(zone, data).await {
                    Ok(()) => report.record_change(format!(
                        "Adding {} record for {} with IP {}",
                        data.record_type, data.name, data.content
                    )),
                    Err(e) => report.record_error(format!(
                        "Failed to add {} record for {}: {}",
                        data.record_type,
                        data.name,
                        e.detail()
                    )),
                }
            }
        }
    }
}
