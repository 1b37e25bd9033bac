// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use embedding_service::{
    api::{start_server, AppState},
    cli::Cli,
    config::ServiceConfig,
    service::EmbeddingService,
    version,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    tracing::info!("🚀 Starting {}", version::get_version_string());
    tracing::info!("📦 BUILD VERSION: {}", version::VERSION);

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "⚙️  Provider: {}, target dimension: {}",
        config.kind(),
        config.target_dim
    );

    // Model loading may download files and run a validation inference
    let target_dim = config.target_dim;
    let provider = match tokio::task::spawn_blocking(move || config.build_provider()).await? {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("❌ Failed to initialize embedding provider: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(info) = provider.model_info() {
        tracing::info!("✅ Model {} ready ({} dimensions)", info.name, info.dimension);
    }

    let addr = cli.socket_addr()?;
    let state = AppState::new(EmbeddingService::new(provider, target_dim));

    start_server(addr, state).await
}
