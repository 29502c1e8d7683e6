/// LLM Client: the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the generation API directly.
/// All LLM interactions MUST go through this module.
///
/// Model: gemini-1.5-flash, hardcoded so every call runs on the same model.
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GOOGLE_API_KEY is not configured")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// The single LLM client used by the assistant.
/// Wraps the `generateContent` endpoint. One attempt per call, no retries:
/// callers own the fallback.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, api_base: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build tuned HTTP client ({e}); using defaults");
                Client::new()
            });

        Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends a single-turn prompt and returns the raw JSON payload.
    ///
    /// A non-success status is an `Api` error; a success status whose body is
    /// not JSON is a `Parse` error.
    pub async fn call(&self, prompt: &str) -> Result<Value, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingCredential)?;

        let request_body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.api_base, MODEL);

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("LLM API returned {}: {}", status, body);
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = serde_json::from_str(&body)?;
        debug!("LLM call succeeded: {} bytes", body.len());
        Ok(payload)
    }

    /// Calls the LLM and extracts the reply text from the payload.
    pub async fn call_text(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = self.call(prompt).await?;
        extract_reply_text(&payload).ok_or(LlmError::EmptyContent)
    }
}

/// Probes the known places a reply can live in a generation payload and
/// returns the first non-empty text.
///
/// Order: `candidates[0].content.parts[*].text` (joined by newline),
/// `candidates[0].content.text`, `candidates[0].output`, top-level `text`.
pub fn extract_reply_text(payload: &Value) -> Option<String> {
    let candidate = payload.pointer("/candidates/0");

    let from_parts = candidate
        .and_then(|c| c.pointer("/content/parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        });

    let probes = [
        from_parts,
        candidate
            .and_then(|c| c.pointer("/content/text"))
            .and_then(Value::as_str)
            .map(str::to_string),
        candidate
            .and_then(|c| c.get("output"))
            .and_then(Value::as_str)
            .map(str::to_string),
        payload
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string),
    ];

    probes
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_joins_all_text_parts() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "First line" }, { "text": "Second line" }] }
            }]
        });
        assert_eq!(
            extract_reply_text(&payload).as_deref(),
            Some("First line\nSecond line")
        );
    }

    #[test]
    fn test_extract_falls_back_to_content_text() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [], "text": "Plain content text" } }]
        });
        assert_eq!(
            extract_reply_text(&payload).as_deref(),
            Some("Plain content text")
        );
    }

    #[test]
    fn test_extract_skips_blank_parts_and_uses_output() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "   " }] }, "output": "From output" }]
        });
        assert_eq!(extract_reply_text(&payload).as_deref(), Some("From output"));
    }

    #[test]
    fn test_extract_top_level_text() {
        let payload = json!({ "text": "Top level" });
        assert_eq!(extract_reply_text(&payload).as_deref(), Some("Top level"));
    }

    #[test]
    fn test_extract_returns_none_when_nothing_usable() {
        assert!(extract_reply_text(&json!({ "candidates": [] })).is_none());
        assert!(extract_reply_text(&json!({})).is_none());
        assert!(extract_reply_text(&json!({ "candidates": [{ "content": { "parts": [{ "inlineData": {} }] } }] })).is_none());
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_request() {
        // Unroutable base: if a request were attempted this would be an Http error.
        let client = LlmClient::new(
            None,
            "http://127.0.0.1:9".to_string(),
            Duration::from_secs(1),
        );
        assert!(!client.has_credential());
        let err = client.call("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential));
    }
}
