//! Cloudflare API response bodies and client setup for wire contract tests

#![allow(dead_code)]

use cfsync_provider_cloudflare::CloudflareProvider;
use mockito::ServerGuard;
use serde_json::{Value, json};

pub const TOKEN: &str = "test-token-abc";

/// Provider pointed at `server`, with the same `/client/v4` prefix as the real API
pub fn provider(server: &ServerGuard) -> CloudflareProvider {
    CloudflareProvider::new(TOKEN)
        .unwrap()
        .with_base_url(format!("{}/client/v4", server.url()))
}

pub fn success(result: Value) -> String {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result
    })
    .to_string()
}

pub fn page(result: Value, page: u32, total_pages: u32) -> String {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
        "result_info": {"page": page, "per_page": 100, "total_pages": total_pages}
    })
    .to_string()
}

pub fn failure(code: u32, message: &str) -> String {
    json!({
        "success": false,
        "errors": [{"code": code, "message": message}],
        "messages": [],
        "result": null
    })
    .to_string()
}
