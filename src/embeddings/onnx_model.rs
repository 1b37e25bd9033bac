// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs a sentence transformer (e.g. all-MiniLM-L6-v2) exported to ONNX.
//!
//! Features:
//! - ONNX model loading from disk
//! - Optional CUDA execution provider (`cuda` feature) with CPU fallback
//! - BERT tokenization with truncation to 256 tokens
//! - Attention-mask weighted mean pooling over token embeddings
//! - Output dimension detected from a validation inference at load time

use anyhow::{anyhow, Context, Result};
use ndarray::{Array2, ArrayView2, ArrayViewD, Axis, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Maximum sequence length fed to the model
pub const MAX_SEQUENCE_LENGTH: usize = 256;

/// ONNX-based sentence embedding model
///
/// Cloning is cheap: the session and tokenizer are shared behind `Arc`.
/// The session sits behind a `Mutex` because `Session::run` needs `&mut`.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

/// Tokenizer output converted to the i64 tensors the model expects
struct EncodedInput {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
    mask: Vec<i64>,
}

fn build_session(model_path: &Path) -> Result<Session> {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        use tracing::warn;

        info!("   Attempting CUDA execution provider...");
        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .commit_from_file(model_path);

        match cuda_result {
            Ok(session) => {
                info!("✅ CUDA execution provider initialized");
                return Ok(session);
            }
            Err(e) => {
                warn!("⚠️  CUDA execution provider failed: {}", e);
                warn!("   Falling back to CPU execution provider");
            }
        }
    }

    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(4)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))
}

/// Mean pooling over `[seq_len, hidden_dim]` token embeddings, weighted by
/// the attention mask so padding tokens are ignored.
pub(crate) fn mean_pool(tokens: ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
    let (_, hidden_dim) = tokens.dim();
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for (i, row) in tokens.outer_iter().enumerate() {
        let mask_value = mask.get(i).copied().unwrap_or(0) as f32;
        if mask_value == 0.0 {
            continue;
        }
        sum_mask += mask_value;
        for (acc, &x) in pooled.iter_mut().zip(row.iter()) {
            *acc += x * mask_value;
        }
    }

    for val in &mut pooled {
        *val /= sum_mask.max(1e-9);
    }

    pooled
}

/// Reduces the first output tensor of the model to one sentence vector.
///
/// Token-level outputs `[batch, seq_len, hidden]` are mean pooled; exports
/// that already pool (`[batch, hidden]`) are passed through.
fn sentence_vector(output: ArrayViewD<'_, f32>, mask: &[i64]) -> Result<Vec<f32>> {
    match output.ndim() {
        3 => {
            let first = output.index_axis(Axis(0), 0);
            let tokens = first
                .into_dimensionality::<Ix2>()
                .context("Failed to view token embeddings as [seq_len, hidden]")?;
            Ok(mean_pool(tokens, mask))
        }
        2 => Ok(output.index_axis(Axis(0), 0).iter().copied().collect()),
        _ => anyhow::bail!(
            "Model outputs unexpected shape: {:?} (expected [batch, seq_len, hidden] or [batch, hidden])",
            output.shape()
        ),
    }
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer from disk and runs one validation
    /// inference to learn the output dimension.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file is missing or invalid
    /// - ONNX Runtime initialization fails
    /// - The validation inference produces an empty or oddly shaped output
    pub fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("🚀 Initializing ONNX embedding model {}", model_name);
        let session = build_session(model_path)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure tokenizer truncation: {}", e))?;
        tokenizer.with_padding(None);

        let mut model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: 0,
        };

        let probe = model
            .embed("validation test")
            .context("Validation inference failed")?;
        if probe.is_empty() {
            anyhow::bail!("Model {} produced an empty embedding", model.model_name);
        }
        model.dimension = probe.len();

        info!(
            "✅ ONNX embedding model {} loaded ({} dimensions)",
            model.model_name, model.dimension
        );

        Ok(model)
    }

    fn encode(&self, text: &str) -> Result<EncodedInput> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();

        Ok(EncodedInput {
            input_ids: Array2::from_shape_vec((1, seq_len), input_ids)
                .context("Failed to create input_ids array")?,
            attention_mask: Array2::from_shape_vec((1, seq_len), mask.clone())
                .context("Failed to create attention_mask array")?,
            token_type_ids: Array2::zeros((1, seq_len)),
            mask,
        })
    }

    /// Generates the sentence embedding for one text.
    ///
    /// Blocking: callers on an async runtime should use `spawn_blocking`.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = self.encode(text)?;
        debug!("Running ONNX inference on {} tokens", input.mask.len());

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(input.input_ids)?,
            "attention_mask" => Value::from_array(input.attention_mask)?,
            "token_type_ids" => Value::from_array(input.token_type_ids)?
        ])?;

        // Index [0] instead of a name: exports differ in output naming
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        sentence_vector(output, &input.mask)
    }

    /// Returns the native output dimension of this model
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}
