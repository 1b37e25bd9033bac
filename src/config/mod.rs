// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service Configuration
//!
//! Everything except host and port comes from the environment and is read
//! once at startup. Invalid values are rejected before the server binds.

use crate::embeddings::gemini::{
    DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, REMOTE_MAX_INPUT_CHARS,
};
use crate::embeddings::local::LOCAL_MAX_INPUT_CHARS;
use crate::embeddings::{
    EmbeddingProvider, GeminiConfig, GeminiEmbeddingClient, LocalModelConfig, LocalModelProvider,
    DEFAULT_LOCAL_MODEL,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Gemini's native `gemini-embedding-001` dimension
pub const DEFAULT_REMOTE_TARGET_DIM: usize = 3072;
/// Native dimension of all-MiniLM-L6-v2
pub const DEFAULT_LOCAL_TARGET_DIM: usize = 384;
pub const DEFAULT_MODELS_DIR: &str = "./models";

/// Startup configuration errors. Any of these stops the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY must be set when EMBEDDING_PROVIDER=gemini")]
    MissingApiKey,

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("EMBEDDING_TARGET_DIM must be greater than zero")]
    ZeroTargetDim,

    #[error("Unknown embedding provider {0:?} (expected \"gemini\" or \"local\")")]
    UnknownProvider(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Failed to load embedding model: {0}")]
    ModelLoad(String),
}

/// Which provider variant this deployment runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Local,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "remote" => Ok(ProviderKind::Gemini),
            "local" | "onnx" => Ok(ProviderKind::Local),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Local => write!(f, "local"),
        }
    }
}

/// Provider-specific settings
#[derive(Debug, Clone)]
pub enum ProviderSettings {
    Gemini(GeminiConfig),
    Local(LocalModelConfig),
}

/// Validated service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub provider: ProviderSettings,
    pub target_dim: usize,
}

fn parse_number<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

impl ServiceConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kind = match get("EMBEDDING_PROVIDER") {
            Some(value) => value.parse::<ProviderKind>()?,
            None => ProviderKind::Gemini,
        };

        let target_dim = match get("EMBEDDING_TARGET_DIM") {
            Some(value) => parse_number::<usize>("EMBEDDING_TARGET_DIM", &value)?,
            None => match kind {
                ProviderKind::Gemini => DEFAULT_REMOTE_TARGET_DIM,
                ProviderKind::Local => DEFAULT_LOCAL_TARGET_DIM,
            },
        };
        if target_dim == 0 {
            return Err(ConfigError::ZeroTargetDim);
        }

        let max_input_chars = match get("EMBEDDING_MAX_CHARS") {
            Some(value) => {
                let max = parse_number::<usize>("EMBEDDING_MAX_CHARS", &value)?;
                if max == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "EMBEDDING_MAX_CHARS",
                        value,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Some(max)
            }
            None => None,
        };

        let provider = match kind {
            ProviderKind::Gemini => {
                let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey)?;
                let timeout_secs = match get("GEMINI_TIMEOUT_SECS") {
                    Some(value) => {
                        let secs = parse_number::<u64>("GEMINI_TIMEOUT_SECS", &value)?;
                        if secs == 0 {
                            return Err(ConfigError::InvalidValue {
                                name: "GEMINI_TIMEOUT_SECS",
                                value,
                                reason: "must be greater than zero".to_string(),
                            });
                        }
                        secs
                    }
                    None => DEFAULT_TIMEOUT_SECS,
                };

                ProviderSettings::Gemini(GeminiConfig {
                    api_key,
                    api_base: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                    model: get("GEMINI_EMBED_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                    timeout: Duration::from_secs(timeout_secs),
                    max_input_chars: max_input_chars.unwrap_or(REMOTE_MAX_INPUT_CHARS),
                })
            }
            ProviderKind::Local => {
                let allow_download = match get("EMBEDDING_MODEL_DOWNLOAD") {
                    Some(value) => parse_bool("EMBEDDING_MODEL_DOWNLOAD", &value)?,
                    None => true,
                };

                ProviderSettings::Local(LocalModelConfig {
                    model_name: get("EMBEDDING_MODEL_NAME")
                        .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
                    models_dir: PathBuf::from(
                        get("EMBEDDING_MODELS_DIR").unwrap_or_else(|| DEFAULT_MODELS_DIR.to_string()),
                    ),
                    allow_download,
                    max_input_chars: max_input_chars.unwrap_or(LOCAL_MAX_INPUT_CHARS),
                })
            }
        };

        Ok(Self {
            provider,
            target_dim,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        match self.provider {
            ProviderSettings::Gemini(_) => ProviderKind::Gemini,
            ProviderSettings::Local(_) => ProviderKind::Local,
        }
    }

    /// Constructs the configured provider.
    ///
    /// For the local variant this loads the model and may download it, so it
    /// blocks. Call from a blocking context.
    pub fn build_provider(&self) -> Result<Arc<dyn EmbeddingProvider>, ConfigError> {
        match &self.provider {
            ProviderSettings::Gemini(config) => {
                let client = GeminiEmbeddingClient::new(config.clone())
                    .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
                Ok(Arc::new(client))
            }
            ProviderSettings::Local(config) => {
                let provider = LocalModelProvider::load(config)
                    .map_err(|e| ConfigError::ModelLoad(format!("{:#}", e)))?;
                Ok(Arc::new(provider))
            }
        }
    }
}
