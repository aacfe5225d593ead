// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! kmsync - Per-project file snapshot sync client.
//!
//! This crate provides the functionality behind the `kamisync` CLI:
//! pushing and pulling a project's files to a km-remote server, and keeping
//! the API key for that server out of plain sight.
//!
//! # Main Components
//!
//! - [`CredentialManager`] - Resolves the API key from the environment, the OS keychain, or an encrypted file
//! - [`SyncClient`] - JSON/HTTP client for the sync protocol with retry and pagination
//! - [`Config`] - Project configuration (project ID, remote URL and tuning)
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use kmsync::{find_work_dir, Config, CredentialManager, SyncClient, SyncConfig};
//!
//! let work_dir = find_work_dir()?;
//! let mut config = Config::load(&work_dir)?;
//! let project_id = config.ensure_project_id(&work_dir)?;
//! let creds = CredentialManager::new(&project_id, &credentials_path(&work_dir));
//!
//! let remote = config.effective_remote()?;
//! let client = SyncClient::new(SyncConfig::new(remote.url, creds.get_api_key()))?;
//! let files = client.pull_files(&project_id, 0).await?;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod id;
pub mod sync;

pub use cli::{AuthCommand, Cli, Command};
pub use config::{credentials_path, find_work_dir, init_work_dir, Config, RemoteConfig};
pub use credentials::{CredentialLookup, CredentialManager, StorageMethod};
pub use error::{Error, Result};
pub use sync::{RetryPolicy, SyncClient, SyncConfig, SyncError};

use std::path::{Path, PathBuf};

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let start = resolve_start(cli.directory)?;
    run_in(&start, cli.command).await
}

/// The directory commands start from: `-C <path>` relative to the current
/// directory, or the current directory itself.
fn resolve_start(directory: Option<PathBuf>) -> Result<PathBuf> {
    Ok(match directory {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => std::env::current_dir()?.join(dir),
        None => std::env::current_dir()?,
    })
}

async fn run_in(start: &Path, command: Command) -> Result<()> {
    match command {
        Command::Init { url } => commands::init::run(start, url),
        Command::Auth(AuthCommand::Set { key }) => commands::auth::set(start, key),
        Command::Auth(AuthCommand::Update { key }) => commands::auth::update(start, key),
        Command::Auth(AuthCommand::Delete) => commands::auth::delete(start),
        Command::Auth(AuthCommand::Status { json }) => commands::auth::status(start, json),
        Command::Health => commands::sync::health(start).await,
        Command::Push { dir } => commands::sync::push(start, dir.as_deref()).await,
        Command::Pull { dir, full } => commands::sync::pull(start, dir.as_deref(), full).await,
        Command::Status => commands::sync::status(start).await,
        Command::DeleteRemote { yes } => commands::sync::delete_remote(start, yes).await,
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
