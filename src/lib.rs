// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod normalize;
pub mod service;
pub mod utils;
pub mod version;

pub use config::{ConfigError, ProviderKind, ServiceConfig};
pub use embeddings::{EmbeddingProvider, ModelInfo, ProviderError};
pub use service::EmbeddingService;
