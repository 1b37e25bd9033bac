// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding Service
//!
//! Immutable context shared by all HTTP handlers: the active provider and
//! the target dimension. Built once at startup and never mutated.

use crate::api::embed::EmbedResponse;
use crate::api::handlers::HealthResponse;
use crate::embeddings::{EmbeddingProvider, ProviderError};
use crate::normalize::normalize_owned;
use crate::utils::truncate_chars;
use std::sync::Arc;
use tracing::debug;

pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    target_dim: usize,
    max_input_chars: usize,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("provider", &self.provider.name())
            .field("target_dim", &self.target_dim)
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

impl EmbeddingService {
    /// `target_dim` is validated as non-zero by the config layer.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, target_dim: usize) -> Self {
        let max_input_chars = provider.max_input_chars();
        Self {
            provider,
            target_dim,
            max_input_chars,
        }
    }

    /// Static status report. Never calls the provider.
    pub fn health(&self) -> HealthResponse {
        let info = self.provider.model_info();
        HealthResponse {
            status: "ok".to_string(),
            target_dim: self.target_dim,
            model: info.as_ref().map(|i| i.name.clone()),
            model_dim: info.map(|i| i.dimension),
        }
    }

    /// Caps the text, embeds it and adjusts the vector to `target_dim`.
    ///
    /// `dim` in the response is the raw provider length, before adjustment.
    pub async fn embed(&self, text: &str) -> Result<EmbedResponse, ProviderError> {
        let capped = truncate_chars(text, self.max_input_chars);
        if capped.len() < text.len() {
            debug!(
                "Input capped to {} characters for provider {}",
                self.max_input_chars,
                self.provider.name()
            );
        }

        let raw = self.provider.embed(capped).await?;
        let dim = raw.len();

        Ok(EmbedResponse {
            embedding: normalize_owned(raw, self.target_dim),
            dim,
        })
    }
}
