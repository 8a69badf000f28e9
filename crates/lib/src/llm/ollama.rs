//! Ollama-style generate client (`POST /api/generate`, non-streaming).
//!
//! The endpoint URL is taken as-is from configuration; any service that accepts
//! `{model, prompt, stream}` and answers `{response}` works.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/api/generate";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a text-generation endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    /// Connection error, timeout, or the body could not be read.
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Service answered with a non-success status.
    #[error("generation api error: {0}")]
    Api(String),
    /// Body was not JSON or had no string `response` field.
    #[error("generation payload malformed: {0}")]
    Malformed(String),
}

impl OllamaError {
    /// True when the service could not be reached or did not answer successfully.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, OllamaError::Request(_) | OllamaError::Api(_))
    }
}

impl OllamaClient {
    /// Build a client for `endpoint` with a request timeout. A zero timeout falls back to 30 seconds.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        let endpoint = endpoint
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("generation client builder failed ({}), using defaults", e);
                reqwest::Client::new()
            });
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the generate request with stream disabled; returns the raw `response` text.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let res = self.client.post(&self.endpoint).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("{} {}", status, body)));
        }
        let text = res.text().await?;
        parse_generate_response(&text)
    }
}

/// Extract the `response` field from a generate payload.
fn parse_generate_response(body: &str) -> Result<String, OllamaError> {
    let data: GenerateResponse =
        serde_json::from_str(body).map_err(|e| OllamaError::Malformed(e.to_string()))?;
    data.response
        .ok_or_else(|| OllamaError::Malformed("missing `response` field".to_string()))
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}
