// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::api::http_server::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub target_dim: usize,
    /// Loaded model name, local provider only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Native dimension of the loaded model, local provider only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dim: Option<usize>,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.service.health())
}
