// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed HTTP handler

use crate::api::embed::{EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{error, info, warn};

/// POST /embed handler
///
/// Body rejections (bad JSON, missing `text`, missing or wrong content type)
/// become 422 with a `detail` message. Provider failures keep their status mapping
/// from [`ApiError`].
pub async fn embed_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected /embed request: {}", rejection.body_text());
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    match state.service.embed(&request.text).await {
        Ok(response) => {
            info!(
                "Embedded {} chars: raw dim {} -> {}",
                request.text.chars().count(),
                response.dim,
                response.embedding.len()
            );
            Ok(Json(response))
        }
        Err(e) => {
            error!("/embed failed: {}", e);
            Err(e.into())
        }
    }
}
