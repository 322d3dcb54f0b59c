//! Run Contract Test: Dry Run
//!
//! Constraints verified:
//! - Dry run issues zero mutating provider calls
//! - Read-only calls (credentials, zone, listing) still happen
//! - Dry run reports the same changes as a live run, phrased as hypothetical

mod common;

use cfsync_core::SyncConfig;
use common::*;

fn provider() -> MockDnsProvider {
    MockDnsProvider::new()
        .with_a("r1", "www.example.com", "1.1.1.1")
        .with_a("r2", "api.example.com", "2.2.2.2")
        .with_aaaa("r3", "www.example.com", "2001:db8::99")
}

fn config(dry_run: bool) -> SyncConfig {
    SyncConfig::new("example.com")
        .with_interface("eth0")
        .with_add_aaaa(true)
        .with_dry_run(dry_run)
}

#[tokio::test]
async fn dry_run_issues_no_mutations() {
    let provider = provider();

    let outcome = engine(
        &provider,
        StaticIpSource::ok("2.2.2.2"),
        Some(StaticIpSource::ok("2001:db8::1")),
        config(true),
    )
    .run()
    .await;

    assert!(outcome.is_success());
    assert!(provider.mutations().is_empty());
    assert_eq!(provider.verify_call_count(), 1);
    assert_eq!(provider.list_call_count(), 2);
    assert!(
        outcome
            .report
            .render()
            .starts_with("*** DRY RUN MODE - NO CHANGES WERE MADE ***")
    );
}

#[tokio::test]
async fn dry_run_reports_the_same_changes_as_live() {
    let dry_provider = provider();
    let live_provider = provider();

    let dry = engine(
        &dry_provider,
        StaticIpSource::ok("2.2.2.2"),
        Some(StaticIpSource::ok("2001:db8::1")),
        config(true),
    )
    .run()
    .await;

    let live = engine(
        &live_provider,
        StaticIpSource::ok("2.2.2.2"),
        Some(StaticIpSource::ok("2001:db8::1")),
        config(false),
    )
    .run()
    .await;

    assert_eq!(
        dry.report.changes(),
        [
            "Would update A record for www.example.com from 1.1.1.1 to 2.2.2.2",
            "Would update AAAA record for www.example.com from 2001:db8::99 to 2001:db8::1",
            "Would add AAAA record for api.example.com with IP 2001:db8::1",
        ]
    );
    assert_eq!(
        live.report.changes(),
        [
            "Updating A record for www.example.com from 1.1.1.1 to 2.2.2.2",
            "Updating AAAA record for www.example.com from 2001:db8::99 to 2001:db8::1",
            "Adding AAAA record for api.example.com with IP 2001:db8::1",
        ]
    );
    assert_eq!(live_provider.mutations().len(), 3);
}
