// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Stored file snapshots and the identifiers that scope them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One stored snapshot of a file, unique per `(project_id, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Partition key scoping the record to one logical project.
    pub project_id: String,
    /// Relative file path, unique within the project.
    pub path: String,
    /// Full file bytes.
    pub content: Vec<u8>,
    /// Caller-supplied content hash. Opaque to the store.
    pub checksum: String,
    /// Caller-supplied local modification time (ms since epoch).
    pub modified: i64,
    /// Caller-supplied byte length.
    pub size: u64,
    /// Server-assigned write stamp (ms), bumped on every upsert.
    pub synced_at: i64,
}

/// Aggregate numbers for one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub file_count: u64,
    /// Newest `synced_at` in the project, `None` when the project is empty.
    pub last_sync: Option<i64>,
}

/// Validates a project id used as a partition key and URL segment.
pub fn validate_project_id(project_id: &str) -> Result<()> {
    if project_id.trim().is_empty()
        || project_id.contains('/')
        || project_id.chars().any(char::is_control)
    {
        return Err(Error::InvalidProjectId(project_id.to_string()));
    }
    Ok(())
}

/// Validates a relative file path as stored by the file store.
///
/// Paths use `/` separators, are relative, and never step outside the
/// project root.
pub fn validate_path(path: &str) -> Result<()> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path.split('/').any(|seg| seg.is_empty() || seg == "..");
    if invalid {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
