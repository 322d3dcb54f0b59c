// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare API v4 client for cfsync.
//
// ## Behavior
//
// - One HTTP request per trait call (pagination aside), no retries
// - HTTP timeout configured (30 seconds)
// - Status codes mapped to error kinds (401/403 → auth, 404 → not found)
// - `errors[0].message` from the response envelope is the error text
// - Dry run is enforced by the engine, which never calls the mutating methods
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Construction fails if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Verify Token: GET `/user/tokens/verify`
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`

mod api;

use api::{Envelope, TokenStatus, Zone};
use async_trait::async_trait;
use cfsync_core::traits::{DnsProvider, DnsRecord, RecordData, RecordType, ZoneId};
use cfsync_core::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per page when listing
const RECORDS_PER_PAGE: u32 = 100;

const PROVIDER: &str = "cloudflare";

/// Cloudflare DNS provider
///
/// Stateless between calls: zone and record identifiers are passed in by the
/// engine on every call and never cached here.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();

        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send an authenticated request and unwrap the response envelope.
    ///
    /// A transport failure, a non-2xx status, or `success: false` all become
    /// errors; the message is `errors[0].message` when the API provided one.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Envelope<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("API call failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) if envelope.success && status.is_success() => Ok(envelope),
            Ok(envelope) => Err(status_error(status, envelope.first_error())),
            Err(e) if status.is_success() => Err(Error::provider(
                PROVIDER,
                format!("Failed to parse response: {}", e),
            )),
            Err(_) => Err(status_error(status, format!("HTTP {}", status))),
        }
    }

    fn records_url(&self, zone: &ZoneId) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone)
    }
}

/// Map an unsuccessful response to an error kind
fn status_error(status: StatusCode, message: String) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(message),
        404 => Error::not_found(message),
        429 => {
            tracing::warn!("Cloudflare rate limit exceeded (status {})", status);
            Error::provider(PROVIDER, message)
        }
        500..=599 => {
            tracing::warn!("Cloudflare server error (transient): {}", status);
            Error::provider(PROVIDER, message)
        }
        _ => Error::provider(PROVIDER, message),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// ```http
    /// GET /user/tokens/verify
    /// Authorization: Bearer <token>
    /// ```
    async fn verify_credentials(&self) -> Result<()> {
        tracing::debug!("Verifying API token");

        let url = format!("{}/user/tokens/verify", self.base_url);
        let envelope: Envelope<TokenStatus> = self.send(self.client.get(&url)).await?;

        match envelope.result {
            Some(token) if token.status == "active" => Ok(()),
            Some(token) => Err(Error::auth(format!("Token status is {}", token.status))),
            None => Err(Error::auth(envelope.first_error())),
        }
    }

    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn resolve_zone(&self, domain: &str) -> Result<ZoneId> {
        tracing::debug!("Looking up zone ID for domain: {}", domain);

        let url = format!("{}/zones", self.base_url);
        let envelope: Envelope<Vec<Zone>> = self
            .send(self.client.get(&url).query(&[("name", domain)]))
            .await?;

        let zone = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("No zone matches {}", domain)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(ZoneId::new(zone.id))
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&page=1&per_page=100
    /// ```
    ///
    /// Follows `result_info.total_pages` so that the full record set is
    /// returned in provider order.
    async fn list_records(&self, zone: &ZoneId, record_type: RecordType) -> Result<Vec<DnsRecord>> {
        let url = self.records_url(zone);
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            tracing::debug!("Listing {} records (page {})", record_type, page);

            let request = self
                .client
                .get(&url)
                .query(&[("type", record_type.as_str())])
                .query(&[("page", page), ("per_page", RECORDS_PER_PAGE)]);
            let envelope: Envelope<Vec<DnsRecord>> = self.send(request).await?;

            let total_pages = envelope
                .result_info
                .as_ref()
                .map(|info| info.total_pages)
                .unwrap_or(1);
            records.extend(envelope.result.unwrap_or_default());

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {"type": "A", "name": "www.example.com", "content": "1.2.3.4", "ttl": 1, "proxied": false}
    /// ```
    async fn update_record(&self, zone: &ZoneId, record_id: &str, data: &RecordData) -> Result<()> {
        let url = format!("{}/{}", self.records_url(zone), record_id);
        let _: Envelope<serde_json::Value> = self.send(self.client.put(&url).json(data)).await?;

        tracing::debug!("DNS record updated successfully: {} -> {}", data.name, data.content);
        Ok(())
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {"type": "AAAA", "name": "www.example.com", "content": "2001:db8::1", "ttl": 1, "proxied": false}
    /// ```
    async fn create_record(&self, zone: &ZoneId, data: &RecordData) -> Result<()> {
        let url = self.records_url(zone);
        let _: Envelope<serde_json::Value> = self.send(self.client.post(&url).json(data)).await?;

        tracing::debug!("DNS record created successfully: {} -> {}", data.name, data.content);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
