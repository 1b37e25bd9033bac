// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::embeddings::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
    pub error_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    Upstream { status: u16, body: String },
    MalformedResponse(String),
    Inference(String),
    Transport(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::Upstream { .. } => "upstream_error",
            ApiError::MalformedResponse(_) => "malformed_response",
            ApiError::Inference(_) => "inference_error",
            ApiError::Transport(_) => "transport_error",
        }
    }

    /// Upstream statuses are passed through; anything unrepresentable becomes 500.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 422,
            ApiError::Upstream { status, .. } => match StatusCode::from_u16(*status) {
                Ok(code) if code.is_client_error() || code.is_server_error() => *status,
                _ => 500,
            },
            ApiError::MalformedResponse(_) | ApiError::Inference(_) | ApiError::Transport(_) => {
                500
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let detail = match self {
            ApiError::Upstream { body, .. } => body.clone(),
            other => other.to_string(),
        };

        ErrorResponse {
            detail,
            error_type: self.error_type().to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::Upstream { status, body } => {
                write!(f, "Upstream embedding API returned {}: {}", status, body)
            }
            ApiError::MalformedResponse(msg) => {
                write!(f, "Malformed response from embedding API: {}", msg)
            }
            ApiError::Inference(msg) => write!(f, "Local inference failed: {}", msg),
            ApiError::Transport(msg) => write!(f, "Embedding API request failed: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Upstream { status, body } => ApiError::Upstream { status, body },
            ProviderError::MalformedResponse(msg) => ApiError::MalformedResponse(msg),
            ProviderError::Inference(msg) => ApiError::Inference(msg),
            ProviderError::Transport(msg) => ApiError::Transport(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
