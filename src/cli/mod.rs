// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};

/// Text embedding HTTP service
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "embedding-service")]
#[command(version)]
#[command(about = "Serves text embeddings over HTTP (GET /health, POST /embed)", long_about = None)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
}

impl Cli {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
