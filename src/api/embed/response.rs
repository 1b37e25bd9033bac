// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedResponse type for POST /embed

use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// # Fields
/// - `embedding`: vector adjusted to the configured target dimension
/// - `dim`: length of the raw provider vector, before adjustment
///
/// # Example
/// ```json
/// { "embedding": [0.1, 0.2, 0.0], "dim": 2 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    pub embedding: Vec<f64>,
    pub dim: usize,
}
