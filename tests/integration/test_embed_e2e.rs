// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-End Integration Tests for the Embedding Endpoint
//!
//! Full stack: axum router -> EmbeddingService -> GeminiEmbeddingClient ->
//! mocked Gemini API.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use embedding_service::{
    api::{create_app, AppState},
    config::ServiceConfig,
    service::EmbeddingService,
};
use mockito::Matcher;
use serde_json::{json, Value};
use std::collections::HashMap;
use tower::util::ServiceExt;

const EMBED_PATH: &str = "/models/gemini-embedding-001:embedContent";

/// Helper: build the app from env-style settings pointing at the mock server
fn setup_app(api_base: &str, extra: &[(&str, &str)]) -> axum::Router {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("EMBEDDING_PROVIDER".into(), "gemini".into());
    vars.insert("GEMINI_API_KEY".into(), "e2e-key".into());
    vars.insert("GEMINI_API_BASE".into(), api_base.into());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }

    let config = ServiceConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let provider = config.build_provider().unwrap();
    create_app(AppState::new(EmbeddingService::new(provider, config.target_dim)))
}

fn embed_request(text: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/embed")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": text }).to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn test_e2e_over_long_text_truncated_before_upstream() {
    let mut server = mockito::Server::new_async().await;
    let capped = "a".repeat(10_000);
    let values: Vec<f64> = vec![0.5; 3072];
    let mock = server
        .mock("POST", EMBED_PATH)
        .match_header("x-goog-api-key", "e2e-key")
        .match_body(Matcher::PartialJson(json!({
            "content": {"parts": [{"text": capped}]}
        })))
        .with_status(200)
        .with_body(json!({"embedding": {"values": values}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let app = setup_app(&server.url(), &[]);
    let response = app.oneshot(embed_request(&"a".repeat(20_000))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["dim"], 3072);
    assert_eq!(body["embedding"].as_array().unwrap().len(), 3072);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_e2e_target_dim_override() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", EMBED_PATH)
        .with_status(200)
        .with_body(r#"{"embedding": {"values": [0.25, 0.5, 0.75, 1.0]}}"#)
        .create_async()
        .await;

    let app = setup_app(&server.url(), &[("EMBEDDING_TARGET_DIM", "2")]);
    let response = app.oneshot(embed_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"embedding": [0.25, 0.5], "dim": 4})
    );
}

#[tokio::test]
async fn test_e2e_upstream_values_returned_verbatim() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", EMBED_PATH)
        .with_status(200)
        .with_body(r#"{"embedding": {"values": [-0.022374554, 0.0123456789012, 0.3]}}"#)
        .create_async()
        .await;

    let app = setup_app(&server.url(), &[("EMBEDDING_TARGET_DIM", "2")]);
    let response = app.oneshot(embed_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let embedding: Vec<f64> = body["embedding"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(embedding, vec![-0.022374554, 0.0123456789012]);
    assert_eq!(body["dim"], 3);
}

#[tokio::test]
async fn test_e2e_upstream_401_passthrough() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", EMBED_PATH)
        .with_status(401)
        .with_body("API key not valid")
        .create_async()
        .await;

    let app = setup_app(&server.url(), &[]);
    let response = app.oneshot(embed_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["detail"], "API key not valid");
}

#[tokio::test]
async fn test_e2e_malformed_upstream_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", EMBED_PATH)
        .with_status(200)
        .with_body(r#"{"embedding": {"values": ["not", "numbers"]}}"#)
        .create_async()
        .await;

    let app = setup_app(&server.url(), &[]);
    let response = app.oneshot(embed_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("malformed response"));
}

#[tokio::test]
async fn test_e2e_health_without_upstream_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = setup_app(&server.url(), &[]);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"status": "ok", "target_dim": 3072})
    );
    mock.assert_async().await;
}
