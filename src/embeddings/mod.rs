// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding Providers
//!
//! A provider turns one text into one raw embedding vector. Two variants
//! exist and exactly one is active per process:
//! - [`GeminiEmbeddingClient`]: remote Gemini `embedContent` API
//! - [`LocalModelProvider`]: sentence transformer executed with ONNX Runtime
//!
//! Handlers only see the [`EmbeddingProvider`] trait object, which keeps the
//! HTTP layer testable with a deterministic fake.

pub mod gemini;
pub mod local;
pub mod onnx_model;

pub use gemini::{GeminiConfig, GeminiEmbeddingClient};
pub use local::{LocalModelConfig, LocalModelProvider, DEFAULT_LOCAL_MODEL};
pub use onnx_model::OnnxEmbeddingModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-request failure of a provider
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// Remote API answered with a non-success status
    #[error("Upstream embedding API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Remote API answered 2xx but without a numeric `embedding.values` list
    #[error("Malformed response from embedding API: {0}")]
    MalformedResponse(String),

    /// Local tokenization or inference failed
    #[error("Local inference failed: {0}")]
    Inference(String),

    /// Remote API could not be reached (connect error, timeout, ...)
    #[error("Embedding API request failed: {0}")]
    Transport(String),
}

/// Information about a locally loaded model, reported by `/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name as requested (or the fallback default)
    pub name: String,
    /// Native output dimension of the model
    pub dimension: usize,
}

/// Capability shared by all embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Produces the raw (not yet normalized) embedding for `text`.
    ///
    /// Values are `f64` so remote floats pass through without rounding.
    async fn embed(&self, text: &str) -> Result<Vec<f64>, ProviderError>;

    /// Short provider identifier used in logs ("gemini", "local").
    fn name(&self) -> &str;

    /// Maximum number of characters forwarded to the provider.
    fn max_input_chars(&self) -> usize;

    /// Loaded model details, only for local providers.
    fn model_info(&self) -> Option<ModelInfo> {
        None
    }
}
