//! Cloudflare API v4 wire types
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! { "success": true, "errors": [], "messages": [], "result": ..., "result_info": {...} }
//! ```

use serde::Deserialize;

/// Response envelope shared by all endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
    pub result_info: Option<ResultInfo>,
}

impl<T> Envelope<T> {
    /// `errors[0].message`, or "Unknown error" when the API gave none
    pub fn first_error(&self) -> String {
        self.errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    pub message: String,
}

/// Pagination block on list endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct ResultInfo {
    #[serde(default)]
    pub total_pages: u32,
}

/// `GET /user/tokens/verify`
#[derive(Debug, Deserialize)]
pub(crate) struct TokenStatus {
    pub status: String,
}

/// Entry of `GET /zones`
#[derive(Debug, Deserialize)]
pub(crate) struct Zone {
    pub id: String,
}
