// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Dimension Normalizer
//!
//! Adjusts a raw provider vector to the configured target dimension:
//! - longer vectors are truncated (tail dropped)
//! - shorter vectors are zero-padded at the tail
//! - equal-length vectors are returned unchanged
//!
//! This is a pure length adjustment. Magnitudes are never rescaled, so a
//! unit-norm input is generally not unit-norm after truncation.

/// Returns a copy of `values` adjusted to exactly `target_dim` elements.
///
/// # Example
/// ```
/// use embedding_service::normalize::normalize;
///
/// assert_eq!(normalize(&[1.0, 2.0, 3.0], 5), vec![1.0, 2.0, 3.0, 0.0, 0.0]);
/// assert_eq!(normalize(&[1.0, 2.0, 3.0, 4.0], 2), vec![1.0, 2.0]);
/// ```
pub fn normalize(values: &[f64], target_dim: usize) -> Vec<f64> {
    if values.len() >= target_dim {
        return values[..target_dim].to_vec();
    }

    let mut adjusted = Vec::with_capacity(target_dim);
    adjusted.extend_from_slice(values);
    adjusted.resize(target_dim, 0.0);
    adjusted
}

/// Same as [`normalize`] but reuses the allocation of an owned vector.
pub fn normalize_owned(mut values: Vec<f64>, target_dim: usize) -> Vec<f64> {
    // resize truncates when shrinking and fills with zeros when growing
    values.resize(target_dim, 0.0);
    values
}
