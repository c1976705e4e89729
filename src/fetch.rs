//! Retried HTTP executor for explorer APIs
//!
//! Every outbound request goes through [`fetch`]: up to six attempts with a
//! short randomized wait between them. The jitter is uniform rather than
//! exponential so that concurrently scheduled syncs sharing one provider do
//! not retry in lockstep. Callers never touch the transport response
//! themselves; the body arrives already parsed per the requested mode.

use rand::Rng;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::SyncError;

const MAX_ATTEMPTS: u32 = 6;
const RETRY_WAIT_MIN_MS: u64 = 200;
const RETRY_WAIT_MAX_MS: u64 = 500;

/// How the response body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Json,
    Text,
}

/// Parsed response body
#[derive(Debug, Clone)]
pub enum FetchBody {
    Json(serde_json::Value),
    Text(String),
}

/// One fully assembled explorer request: target, query parameters and
/// headers. Immutable once built; a new request is assembled per call.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub mode: FetchMode,
}

impl FetchRequest {
    pub fn json(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            mode: FetchMode::Json,
        }
    }

    pub fn text(url: impl Into<String>) -> Self {
        Self {
            mode: FetchMode::Text,
            ..Self::json(url)
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Execute one request with internal retries.
///
/// Exhausting all attempts surfaces [`SyncError::FetchFailed`]; no layer
/// above this one retries.
pub async fn fetch(client: &reqwest::Client, request: &FetchRequest) -> Result<FetchBody, SyncError> {
    let mut last_error = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        match attempt_fetch(client, request).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                last_error = e.to_string();
                log::warn!(
                    "Fetch attempt {}/{} for {} failed: {}",
                    attempt,
                    MAX_ATTEMPTS,
                    request.url,
                    last_error
                );
                if attempt < MAX_ATTEMPTS {
                    let wait_ms = {
                        let mut rng = rand::thread_rng();
                        rng.gen_range(RETRY_WAIT_MIN_MS..=RETRY_WAIT_MAX_MS)
                    };
                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                }
            }
        }
    }

    Err(SyncError::FetchFailed(format!(
        "{} after {} attempts: {}",
        request.url, MAX_ATTEMPTS, last_error
    )))
}

/// Execute one JSON request and deserialize the body into `T`
pub async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    request: &FetchRequest,
) -> Result<T, SyncError> {
    match fetch(client, request).await? {
        FetchBody::Json(value) => serde_json::from_value(value)
            .map_err(|e| SyncError::FetchFailed(format!("decoding {}: {}", request.url, e))),
        FetchBody::Text(text) => serde_json::from_str(&text)
            .map_err(|e| SyncError::FetchFailed(format!("decoding {}: {}", request.url, e))),
    }
}

async fn attempt_fetch(
    client: &reqwest::Client,
    request: &FetchRequest,
) -> Result<FetchBody, reqwest::Error> {
    let mut builder = client.get(&request.url);
    if !request.params.is_empty() {
        builder = builder.query(&request.params);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder.send().await?;
    match request.mode {
        FetchMode::Json => Ok(FetchBody::Json(response.json().await?)),
        FetchMode::Text => Ok(FetchBody::Text(response.text().await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = FetchRequest::json("https://example.org/api")
            .param("module", "account")
            .param("action", "balance")
            .header("Accept", "application/json");
        assert_eq!(request.mode, FetchMode::Json);
        assert_eq!(request.params.len(), 2);
        assert_eq!(request.headers[0].0, "Accept");
    }

    #[test]
    fn test_text_mode() {
        let request = FetchRequest::text("https://example.org/page");
        assert_eq!(request.mode, FetchMode::Text);
    }
}
