// # HTTP IP Source
//
// This crate provides the public IPv4 source for cfsync.
//
// ## Purpose
//
// The host usually sits behind NAT, so its public IPv4 address cannot be
// read from a local interface. Instead, a plain-text echo service reports
// the address it sees the request coming from.
//
// ## Behavior
//
// - One unauthenticated GET per call, no retries, no caching
// - Response body is trimmed and parsed as an IP address
// - Anything that is not an IPv4 address is an error

use cfsync_core::traits::{IpSource, IpVersion};
use cfsync_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Default echo service (plain text body, IPv4 only endpoint)
pub const DEFAULT_IP_SERVICE: &str = "https://api.ipify.org";

/// HTTP timeout for the echo request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Public IPv4 source backed by an HTTP echo service
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source querying [`DEFAULT_IP_SERVICE`]
    pub fn new() -> Result<Self> {
        Self::with_url(DEFAULT_IP_SERVICE)
    }

    /// Create a source querying a custom echo service
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

/// Parse an echo-service body into an IPv4 address
fn parse_ipv4(body: &str) -> Result<IpAddr> {
    let text = body.trim();

    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::ip_source(format!("Invalid IP address: {:?}", text)))?;

    if !ip.is_ipv4() {
        return Err(Error::ip_source(format!("Expected IPv4, got: {}", ip)));
    }

    Ok(ip)
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        tracing::debug!("Fetching public IPv4 address from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        let ip = parse_ipv4(&body)?;
        tracing::debug!("Public IPv4 address: {}", ip);
        Ok(ip)
    }

    fn version(&self) -> IpVersion {
        IpVersion::V4
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
