// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Local model loading and inference
//!
//! Tests that need real model files are ignored by default. They expect an
//! ONNX export in `/workspace/models/all-MiniLM-L6-v2-onnx/`.

use embedding_service::embeddings::local::{local_model_dir, LOCAL_MAX_INPUT_CHARS};
use embedding_service::embeddings::{
    EmbeddingProvider, LocalModelConfig, LocalModelProvider, DEFAULT_LOCAL_MODEL,
};
use std::path::PathBuf;

const MODELS_DIR: &str = "/workspace/models";

fn offline_config(models_dir: PathBuf, model_name: &str) -> LocalModelConfig {
    LocalModelConfig {
        model_name: model_name.to_string(),
        models_dir,
        allow_download: false,
        max_input_chars: LOCAL_MAX_INPUT_CHARS,
    }
}

#[test]
fn test_missing_model_fails_after_fallback() {
    let tmp = tempfile::tempdir().unwrap();
    let result = LocalModelProvider::load(&offline_config(
        tmp.path().to_path_buf(),
        "sentence-transformers/does-not-exist",
    ));

    let err = result.unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("does-not-exist"), "{}", msg);
    assert!(msg.contains(DEFAULT_LOCAL_MODEL), "{}", msg);
}

#[test]
fn test_missing_default_model_fails_without_retry() {
    let tmp = tempfile::tempdir().unwrap();
    let err = LocalModelProvider::load(&offline_config(
        tmp.path().to_path_buf(),
        DEFAULT_LOCAL_MODEL,
    ))
    .unwrap_err();

    assert!(err.to_string().contains("downloads are disabled"));
}

#[test]
fn test_corrupt_model_file_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = local_model_dir(tmp.path(), DEFAULT_LOCAL_MODEL);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("model.onnx"), b"not an onnx graph").unwrap();
    std::fs::write(dir.join("tokenizer.json"), b"{}").unwrap();

    let result = LocalModelProvider::load(&offline_config(
        tmp.path().to_path_buf(),
        DEFAULT_LOCAL_MODEL,
    ));
    assert!(result.is_err());
}

#[tokio::test]
#[ignore] // Requires all-MiniLM-L6-v2 under /workspace/models
async fn test_real_model_embedding() {
    let provider =
        LocalModelProvider::load(&offline_config(PathBuf::from(MODELS_DIR), DEFAULT_LOCAL_MODEL))
            .unwrap();

    let info = provider.model_info().unwrap();
    assert_eq!(info.name, DEFAULT_LOCAL_MODEL);
    assert_eq!(info.dimension, 384);
    assert_eq!(provider.name(), "local");

    let embedding = provider.embed("The quick brown fox").await.unwrap();
    assert_eq!(embedding.len(), 384);
    assert!(embedding.iter().all(|v| v.is_finite()));
}

#[tokio::test]
#[ignore] // Requires all-MiniLM-L6-v2 under /workspace/models
async fn test_real_model_fallback_to_default() {
    let provider =
        LocalModelProvider::load(&offline_config(PathBuf::from(MODELS_DIR), "does-not-exist"))
            .unwrap();

    let info = provider.model_info().unwrap();
    assert_eq!(info.name, DEFAULT_LOCAL_MODEL);
    assert_eq!(info.dimension, 384);

    let embedding = provider.embed("served by the fallback model").await.unwrap();
    assert_eq!(embedding.len(), 384);
}

#[tokio::test]
#[ignore] // Requires all-MiniLM-L6-v2 under /workspace/models
async fn test_real_model_is_deterministic() {
    let provider =
        LocalModelProvider::load(&offline_config(PathBuf::from(MODELS_DIR), DEFAULT_LOCAL_MODEL))
            .unwrap();

    let a = provider.embed("same input").await.unwrap();
    let b = provider.embed("same input").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
#[ignore] // Requires all-MiniLM-L6-v2 under /workspace/models
async fn test_real_model_handles_long_input() {
    let provider =
        LocalModelProvider::load(&offline_config(PathBuf::from(MODELS_DIR), DEFAULT_LOCAL_MODEL))
            .unwrap();

    // Tokenizer truncation keeps this within the model's sequence limit
    let text = "word ".repeat(5_000);
    let embedding = provider.embed(&text).await.unwrap();
    assert_eq!(embedding.len(), 384);
}
