// Version information for the embedding service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-gemini-onnx-embeddings-2025-11-04";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-04";

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Embedding Service {} ({})", VERSION_NUMBER, BUILD_DATE)
}
