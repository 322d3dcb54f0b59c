// # IP Source Trait
//
// Defines the interface for discovering the host's current address.
//
// ## Implementations
//
// - HTTP echo service (public IPv4): `cfsync-ip-http` crate
// - Interface address dump (stable IPv6, Linux): `cfsync-ip-netlink` crate
//
// ## Usage
//
// ```rust,ignore
// use cfsync_core::IpSource;
//
// #[tokio::main]
// async fn main() -> cfsync_core::Result<()> {
//     let source = /* IpSource implementation */;
//     let current_ip = source.current().await?;
//     println!("Current address: {}", current_ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Version of a concrete address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// Trait for IP source implementations
///
/// A source answers one question per run: what is the current address?
/// Sources never retry and never cache across calls; a failure is returned
/// to the [`AddressResolver`](crate::resolver::AddressResolver), which decides
/// whether it is fatal for the run.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error)`: If unable to determine the current IP
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// The IP version this source yields
    fn version(&self) -> IpVersion;

    /// Short human-readable description of where the address comes from
    fn describe(&self) -> String;
}
