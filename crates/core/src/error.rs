// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for km-core operations.

use thiserror::Error;

/// All possible errors that can occur in km-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid project id: '{0}'\n  hint: project ids are non-empty and contain no '/'")]
    InvalidProjectId(String),

    #[error("invalid path: '{0}'\n  hint: paths are relative, non-empty, and may not contain '..'")]
    InvalidPath(String),

    #[error("invalid content encoding for '{path}': {reason}")]
    InvalidContent { path: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for km-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
