// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::credentials::CredentialError;
use crate::sync::SyncError;

/// All possible errors surfaced by the kamisync CLI.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'kamisync init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("no remote configured\n  hint: run 'kamisync init --url <url>' or set KAMIFLOW_SYNC_URL")]
    NoRemote,

    #[error("no credentials configured\n  hint: run 'kamisync auth set <key>' or set KAMIFLOW_SYNC_API_KEY")]
    NoCredentials,

    #[error("stored credentials are unreadable: {0}\n  hint: run 'kamisync auth update <key>' to replace them")]
    CredentialsCorrupted(String),

    #[error("refusing to write outside the sync directory: {0}")]
    UnsafePath(String),

    #[error("{action} requires confirmation\n  hint: pass --yes to proceed")]
    ConfirmationRequired { action: &'static str },

    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Core(#[from] km_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// A specialized Result type for kamisync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
