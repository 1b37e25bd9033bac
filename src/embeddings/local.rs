// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Local Model Provider
//!
//! Loads one sentence transformer at startup and serves every request from
//! it. Loading tries the configured model first and then, once, the fixed
//! default model. If both fail the process must not start.
//!
//! Model files are looked up as `{models_dir}/{name}-onnx/model.onnx` and
//! `{models_dir}/{name}-onnx/tokenizer.json`. When missing and downloads are
//! allowed, they are fetched from the HuggingFace Hub (`onnx/model.onnx` and
//! `tokenizer.json` of the repo; bare names map to `sentence-transformers/<name>`).

use crate::embeddings::{EmbeddingProvider, ModelInfo, OnnxEmbeddingModel, ProviderError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Model used when the configured one cannot be loaded
pub const DEFAULT_LOCAL_MODEL: &str = "all-MiniLM-L6-v2";
/// Characters of input forwarded to the local model
pub const LOCAL_MAX_INPUT_CHARS: usize = 8_000;

const HUB_NAMESPACE: &str = "sentence-transformers";
const HUB_MODEL_FILE: &str = "onnx/model.onnx";
const HUB_TOKENIZER_FILE: &str = "tokenizer.json";

/// Settings for [`LocalModelProvider::load`]
#[derive(Debug, Clone)]
pub struct LocalModelConfig {
    pub model_name: String,
    pub models_dir: PathBuf,
    pub allow_download: bool,
    pub max_input_chars: usize,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_LOCAL_MODEL.to_string(),
            models_dir: PathBuf::from("./models"),
            allow_download: true,
            max_input_chars: LOCAL_MAX_INPUT_CHARS,
        }
    }
}

/// Last path segment of a model name: "org/name" -> "name"
fn short_name(model_name: &str) -> &str {
    model_name.rsplit('/').next().unwrap_or(model_name)
}

/// HuggingFace Hub repository for a model name
pub fn hub_repo_id(model_name: &str) -> String {
    if model_name.contains('/') {
        model_name.to_string()
    } else {
        format!("{}/{}", HUB_NAMESPACE, model_name)
    }
}

/// Directory holding the ONNX export of `model_name` under `models_dir`
pub fn local_model_dir(models_dir: &Path, model_name: &str) -> PathBuf {
    models_dir.join(format!("{}-onnx", short_name(model_name)))
}

fn download_model_files(model_name: &str) -> Result<(PathBuf, PathBuf)> {
    let repo_id = hub_repo_id(model_name);
    info!("📥 Downloading {} from HuggingFace Hub", repo_id);

    let api = hf_hub::api::sync::Api::new().context("Failed to initialize HuggingFace Hub client")?;
    let repo = api.model(repo_id.clone());
    let model_path = repo
        .get(HUB_MODEL_FILE)
        .with_context(|| format!("Failed to download {} from {}", HUB_MODEL_FILE, repo_id))?;
    let tokenizer_path = repo
        .get(HUB_TOKENIZER_FILE)
        .with_context(|| format!("Failed to download {} from {}", HUB_TOKENIZER_FILE, repo_id))?;

    Ok((model_path, tokenizer_path))
}

/// Finds the model and tokenizer files, downloading them if allowed.
pub fn resolve_model_files(
    model_name: &str,
    models_dir: &Path,
    allow_download: bool,
) -> Result<(PathBuf, PathBuf)> {
    let dir = local_model_dir(models_dir, model_name);
    let model_path = dir.join("model.onnx");
    let tokenizer_path = dir.join("tokenizer.json");

    if model_path.exists() && tokenizer_path.exists() {
        info!("📦 Using local model files in {}", dir.display());
        return Ok((model_path, tokenizer_path));
    }

    if !allow_download {
        anyhow::bail!(
            "Model {} not found in {} and downloads are disabled",
            model_name,
            dir.display()
        );
    }

    download_model_files(model_name)
}

fn load_model(model_name: &str, config: &LocalModelConfig) -> Result<OnnxEmbeddingModel> {
    let (model_path, tokenizer_path) =
        resolve_model_files(model_name, &config.models_dir, config.allow_download)?;
    OnnxEmbeddingModel::new(model_name, model_path, tokenizer_path)
}

/// Local embedding provider holding one loaded model
#[derive(Debug, Clone)]
pub struct LocalModelProvider {
    model: OnnxEmbeddingModel,
    max_input_chars: usize,
}

impl LocalModelProvider {
    /// Loads the configured model, falling back once to [`DEFAULT_LOCAL_MODEL`].
    ///
    /// Blocking: performs file IO, optional downloads and a validation
    /// inference. Run it on a blocking thread when called from async code.
    pub fn load(config: &LocalModelConfig) -> Result<Self> {
        let model = match load_model(&config.model_name, config) {
            Ok(model) => model,
            Err(e) if config.model_name != DEFAULT_LOCAL_MODEL => {
                warn!(
                    "⚠️  Failed to load embedding model {}: {:#}",
                    config.model_name, e
                );
                warn!("   Falling back to {}", DEFAULT_LOCAL_MODEL);
                load_model(DEFAULT_LOCAL_MODEL, config).map_err(|fallback_err| {
                    error!(
                        "✗ Failed to load fallback model {}: {:#}",
                        DEFAULT_LOCAL_MODEL, fallback_err
                    );
                    fallback_err.context(format!(
                        "Failed to load {} and fallback {}",
                        config.model_name, DEFAULT_LOCAL_MODEL
                    ))
                })?
            }
            Err(e) => {
                error!("✗ Failed to load embedding model {}: {:#}", config.model_name, e);
                return Err(e);
            }
        };

        Ok(Self::from_model(model, config.max_input_chars))
    }

    /// Wraps an already loaded model.
    pub fn from_model(model: OnnxEmbeddingModel, max_input_chars: usize) -> Self {
        Self {
            model,
            max_input_chars,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for LocalModelProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
        let model = self.model.clone();
        let text = text.to_string();

        let values = tokio::task::spawn_blocking(move || model.embed(&text))
            .await
            .map_err(|e| ProviderError::Inference(format!("inference task failed: {}", e)))?
            .map_err(|e| ProviderError::Inference(format!("{:#}", e)))?;

        // f32 -> f64 is exact
        Ok(values.into_iter().map(f64::from).collect())
    }

    fn name(&self) -> &str {
        "local"
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn model_info(&self) -> Option<ModelInfo> {
        Some(ModelInfo {
            name: self.model.model_name().to_string(),
            dimension: self.model.dimension(),
        })
    }
}
