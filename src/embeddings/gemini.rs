// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Gemini Embedding Client
//!
//! Calls `POST {base}/models/{model}:embedContent` with an `x-goog-api-key`
//! header and reads the vector from `embedding.values`.
//!
//! # Request Body
//! ```json
//! {
//!   "model": "models/gemini-embedding-001",
//!   "content": { "parts": [{ "text": "..." }] }
//! }
//! ```
//!
//! # Response Body
//! ```json
//! { "embedding": { "values": [0.01, -0.02, ...] } }
//! ```

use crate::embeddings::{EmbeddingProvider, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-embedding-001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Characters of input forwarded to the remote API
pub const REMOTE_MAX_INPUT_CHARS: usize = 10_000;

/// Settings for [`GeminiEmbeddingClient`]
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
    pub max_input_chars: usize,
}

impl GeminiConfig {
    /// Config with production defaults for the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_input_chars: REMOTE_MAX_INPUT_CHARS,
        }
    }

    /// Full `embedContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:embedContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Remote embedding provider backed by the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingClient {
    client: Client,
    config: GeminiConfig,
    endpoint: String,
}

impl GeminiEmbeddingClient {
    /// Builds the HTTP client with the configured timeout.
    ///
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let endpoint = config.endpoint();

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }
}

/// Pulls `embedding.values` out of a response body.
///
/// Every element must be a JSON number; anything else is treated as a
/// malformed response rather than silently coerced.
fn extract_values(data: &Value) -> Result<Vec<f64>, ProviderError> {
    let values = data
        .get("embedding")
        .and_then(|e| e.get("values"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ProviderError::MalformedResponse("missing numeric list at `embedding.values`".to_string())
        })?;

    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().ok_or_else(|| {
                ProviderError::MalformedResponse(format!(
                    "`embedding.values[{}]` is not a number",
                    i
                ))
            })
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
        let request = EmbedContentRequest {
            model: format!("models/{}", self.config.model),
            content: Content {
                parts: [Part { text }],
            },
        };

        debug!(
            "Requesting Gemini embedding ({} chars) from {}",
            text.chars().count(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                warn!("Failed to read Gemini error body ({}): {}", status, e);
                ProviderError::Transport(format!(
                    "upstream returned {} but the body could not be read: {}",
                    status, e
                ))
            })?;
            warn!("Gemini embedding API error ({}): {}", status, body);
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(format!("body is not JSON: {}", e)))?;

        extract_values(&data)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn max_input_chars(&self) -> usize {
        self.config.max_input_chars
    }
}
