//! Test doubles and common utilities for run contract tests
//!
//! The doubles are `Clone` and share their counters through `Arc`, so a test
//! can hand one copy to the engine and keep another for assertions.

#![allow(dead_code)]

use cfsync_core::error::{Error, Result};
use cfsync_core::traits::{
    DnsProvider, DnsRecord, IpSource, IpVersion, Notification, Notifier, RecordData, RecordType,
    ZoneId,
};
use cfsync_core::{AddressResolver, SyncConfig, SyncEngine};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IP source that returns a fixed address or a fixed failure
#[derive(Clone)]
pub struct StaticIpSource {
    ip: Option<IpAddr>,
    failure: String,
    version: IpVersion,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn ok(ip: &str) -> Self {
        let ip: IpAddr = ip.parse().expect("valid test address");
        Self {
            ip: Some(ip),
            failure: String::new(),
            version: IpVersion::of(&ip),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(version: IpVersion, message: &str) -> Self {
        Self {
            ip: None,
            failure: message.to_string(),
            version,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report `version` regardless of the address actually returned
    pub fn claiming(mut self, version: IpVersion) -> Self {
        self.version = version;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ip.ok_or_else(|| Error::ip_source(self.failure.clone()))
    }

    fn version(&self) -> IpVersion {
        self.version
    }

    fn describe(&self) -> String {
        "static test source".to_string()
    }
}

/// A mutation observed by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Update { record_id: String, data: RecordData },
    Create { data: RecordData },
}

/// A DNS provider serving canned records and tracking mutations
#[derive(Clone)]
pub struct MockDnsProvider {
    pub credentials_valid: bool,
    pub zone: Option<ZoneId>,
    pub a_records: Vec<DnsRecord>,
    pub aaaa_records: Vec<DnsRecord>,
    pub listing_fails: bool,
    /// Record names whose update/create is rejected
    pub rejected_names: HashSet<String>,
    verify_calls: Arc<AtomicUsize>,
    list_calls: Arc<AtomicUsize>,
    mutations: Arc<Mutex<Vec<Mutation>>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            credentials_valid: true,
            zone: Some(ZoneId::new("zone-123")),
            a_records: Vec::new(),
            aaaa_records: Vec::new(),
            listing_fails: false,
            rejected_names: HashSet::new(),
            verify_calls: Arc::new(AtomicUsize::new(0)),
            list_calls: Arc::new(AtomicUsize::new(0)),
            mutations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_a(mut self, id: &str, name: &str, content: &str) -> Self {
        self.a_records.push(record(id, RecordType::A, name, content));
        self
    }

    pub fn with_aaaa(mut self, id: &str, name: &str, content: &str) -> Self {
        self.aaaa_records.push(record(id, RecordType::Aaaa, name, content));
        self
    }

    pub fn without_zone(mut self) -> Self {
        self.zone = None;
        self
    }

    pub fn rejecting(mut self, name: &str) -> Self {
        self.rejected_names.insert(name.to_string());
        self
    }

    pub fn verify_call_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn verify_credentials(&self) -> Result<()> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.credentials_valid {
            Ok(())
        } else {
            Err(Error::auth("Invalid API Token"))
        }
    }

    async fn resolve_zone(&self, domain: &str) -> Result<ZoneId> {
        self.zone
            .clone()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain)))
    }

    async fn list_records(&self, _zone: &ZoneId, record_type: RecordType) -> Result<Vec<DnsRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails {
            return Err(Error::http("connection reset by peer"));
        }
        Ok(match record_type {
            RecordType::A => self.a_records.clone(),
            RecordType::Aaaa => self.aaaa_records.clone(),
        })
    }

    async fn update_record(&self, _zone: &ZoneId, record_id: &str, data: &RecordData) -> Result<()> {
        self.mutations.lock().unwrap().push(Mutation::Update {
            record_id: record_id.to_string(),
            data: data.clone(),
        });
        if self.rejected_names.contains(&data.name) {
            return Err(Error::provider("mock", "Record is locked."));
        }
        Ok(())
    }

    async fn create_record(&self, _zone: &ZoneId, data: &RecordData) -> Result<()> {
        self.mutations
            .lock()
            .unwrap()
            .push(Mutation::Create { data: data.clone() });
        if self.rejected_names.contains(&data.name) {
            return Err(Error::provider("mock", "Record already exists."));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A notifier that records what it was asked to send
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub failure: Option<String>,
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        match &self.failure {
            Some(message) => Err(Error::notify(message.clone())),
            None => Ok(()),
        }
    }
}

pub fn record(id: &str, record_type: RecordType, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        record_type,
        name: name.to_string(),
        content: content.to_string(),
        ttl: 1,
        proxied: false,
    }
}

/// Build an engine without email reporting
pub fn engine(
    provider: &MockDnsProvider,
    ipv4: StaticIpSource,
    ipv6: Option<StaticIpSource>,
    config: SyncConfig,
) -> SyncEngine {
    let resolver = AddressResolver::new(
        Box::new(ipv4),
        ipv6.map(|source| Box::new(source) as Box<dyn IpSource>),
    );
    SyncEngine::new(Box::new(provider.clone()), resolver, None, config)
        .expect("engine construction succeeds")
}

/// Build an engine that reports through `notifier`
pub fn engine_with_notifier(
    provider: &MockDnsProvider,
    ipv4: StaticIpSource,
    ipv6: Option<StaticIpSource>,
    notifier: &RecordingNotifier,
    config: SyncConfig,
) -> SyncEngine {
    let resolver = AddressResolver::new(
        Box::new(ipv4),
        ipv6.map(|source| Box::new(source) as Box<dyn IpSource>),
    );
    SyncEngine::new(
        Box::new(provider.clone()),
        resolver,
        Some(Box::new(notifier.clone())),
        config,
    )
    .expect("engine construction succeeds")
}
