// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

/// Returns the longest prefix of `text` holding at most `max_chars` characters.
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
