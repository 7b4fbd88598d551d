//! Shop backend API client.
//!
//! Thin HTTP layer shared by every backend call: base-URL normalisation,
//! a shared client with timeouts, friendly error mapping, and tolerant
//! JSON body handling. The register workflow is unauthenticated, so no
//! credential headers are attached here.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default timeout for API requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend base URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment (paths passed to the client include it)
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /api
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    // Strip trailing slashes again (in case "/api/" was present)
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach shop backend at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid backend URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        404 => "Backend endpoint not found".to_string(),
        s if s >= 500 => format!("Shop backend server error (HTTP {s})"),
        s => format!("Unexpected response from shop backend (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client bound to one backend base URL.
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;
        Ok(Self {
            base_url: normalize_base_url(base_url),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` (leading slash, e.g. `/api/caja/meta`) with query pairs.
    /// Returns the parsed JSON body, or `Value::Null` for an empty body
    /// (the accumulated-summary endpoint answers 204 when there is no data).
    pub async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, String> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "GET");
        let req = self.client.get(&url).query(query);
        self.execute(req).await
    }

    /// POST `path` with query pairs and an optional JSON body.
    pub async fn post_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, String> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "POST");
        let mut req = self
            .client
            .post(&url)
            .query(query)
            .header("Content-Type", "application/json");
        if let Some(b) = body {
            req = req.json(b);
        }
        self.execute(req).await
    }

    async fn execute(&self, req: reqwest::RequestBuilder) -> Result<Value, String> {
        let resp = req
            .send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))?;
        let status = resp.status();

        if !status.is_success() {
            // Preserve whatever detail the backend put in the error body.
            let body_text = resp.text().await.unwrap_or_default();
            let detail = if let Ok(json) = serde_json::from_str::<Value>(&body_text) {
                let message = json
                    .get("error")
                    .or_else(|| json.get("message"))
                    .and_then(Value::as_str)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| status_error(status));
                format!("{message} (HTTP {})", status.as_u16())
            } else if !body_text.trim().is_empty() {
                format!(
                    "{} (HTTP {}): {}",
                    status_error(status),
                    status.as_u16(),
                    body_text.trim()
                )
            } else {
                format!("{} (HTTP {})", status_error(status), status.as_u16())
            };
            return Err(detail);
        }

        // Return the JSON body, or null for empty 200/204 responses.
        let body_text = resp.text().await.unwrap_or_default();
        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text).map_err(|e| format!("Invalid JSON from shop backend: {e}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
