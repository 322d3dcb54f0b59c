//! Address resolution
//!
//! Produces the [`ResolvedAddresses`] for a run: the public IPv4 address
//! (required) and, when an interface source is configured, its stable global
//! IPv6 address (best effort).

use crate::error::{Error, Result};
use crate::report::RunReport;
use crate::traits::{IpSource, IpVersion};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{info, warn};

/// Addresses resolved once per run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedAddresses {
    /// Public IPv4 address
    pub ipv4: Option<Ipv4Addr>,
    /// Permanent global IPv6 address of the configured interface
    pub ipv6: Option<Ipv6Addr>,
}

/// Resolves the desired record contents from the configured IP sources
pub struct AddressResolver {
    ipv4: Box<dyn IpSource>,
    ipv6: Option<Box<dyn IpSource>>,
}

impl AddressResolver {
    /// Create a resolver. `ipv6` is `None` when no interface was configured.
    pub fn new(ipv4: Box<dyn IpSource>, ipv6: Option<Box<dyn IpSource>>) -> Self {
        Self { ipv4, ipv6 }
    }

    /// Resolve the addresses for this run.
    ///
    /// IPv4 failure is fatal: the error is recorded in `report` and returned.
    /// IPv6 failure is recorded in `report` and leaves `ipv6` unset.
    pub async fn resolve(&self, report: &mut RunReport) -> Result<ResolvedAddresses> {
        let ipv4 = match fetch(self.ipv4.as_ref(), IpVersion::V4, narrow_v4).await {
            Ok(ip) => ip,
            Err(e) => {
                report.record_error(format!(
                    "Failed to retrieve public IPv4 address: {}",
                    e.detail()
                ));
                return Err(e);
            }
        };
        info!("Public IPv4: {}", ipv4);

        let ipv6 = match &self.ipv6 {
            Some(source) => match fetch(source.as_ref(), IpVersion::V6, narrow_v6).await {
                Ok(ip) => {
                    info!("Permanent IPv6 address found via {}: {}", source.describe(), ip);
                    Some(ip)
                }
                Err(e) => {
                    report.record_error(e.detail());
                    None
                }
            },
            None => {
                warn!("No interface specified for IPv6 lookup");
                None
            }
        };

        let addresses = ResolvedAddresses {
            ipv4: Some(ipv4),
            ipv6,
        };
        report.set_addresses(addresses);
        Ok(addresses)
    }
}

/// Query `source`, rejecting a source wired for the wrong family as well as
/// an address of the wrong family.
async fn fetch<T>(
    source: &dyn IpSource,
    expected: IpVersion,
    narrow: fn(IpAddr) -> Option<T>,
) -> Result<T> {
    if source.version() != expected {
        return Err(Error::config(format!(
            "{} yields {} addresses, expected {}",
            source.describe(),
            source.version(),
            expected
        )));
    }

    let ip = source.current().await?;
    narrow(ip).ok_or_else(|| {
        Error::ip_source(format!(
            "Expected {} from {}, got: {}",
            expected,
            source.describe(),
            ip
        ))
    })
}

fn narrow_v4(ip: IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    }
}

fn narrow_v6(ip: IpAddr) -> Option<Ipv6Addr> {
    match ip {
        IpAddr::V6(ip) => Some(ip),
        IpAddr::V4(_) => None,
    }
}
