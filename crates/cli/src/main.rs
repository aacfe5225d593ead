// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use kmsync::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    setup_logging();

    let cli = Cli::parse();
    if let Err(e) = kmsync::run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, quiet unless `RUST_LOG` asks for more.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
