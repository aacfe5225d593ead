// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! km-remote: HTTP sync server for kamisync file snapshots.
//!
//! Stores every project's files in one SQLite database and serves the
//! push/pull protocol defined in `km_core::protocol`.

mod error;
mod server;
#[cfg(test)]
mod server_tests;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use state::ServerState;

/// km-remote: kamisync file snapshot server
#[derive(Parser, Debug)]
#[command(name = "km-remote")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP sync server for kamisync file snapshots")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1:7890")]
    bind: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "KAMIFLOW_SYNC_DB", default_value = "kamisync.db")]
    db: PathBuf,

    /// Require this bearer key on /v1 requests
    #[arg(long, env = "KAMIFLOW_SYNC_SERVER_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging();

    let api_key = args.api_key.filter(|key| !key.trim().is_empty());

    info!("Starting km-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Database: {}", args.db.display());
    if api_key.is_none() {
        warn!("no api key configured, /v1 requests are unauthenticated");
    }

    let state = ServerState::open(&args.db, api_key)?;
    let listener = TcpListener::bind(args.bind).await?;
    info!("Listening on: {}", listener.local_addr()?);

    server::serve(listener, state.clone(), shutdown_signal()).await?;

    info!("Server stopped, closing database");
    state.close()?;
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
