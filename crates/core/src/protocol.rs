// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSON wire protocol shared by the sync client and the remote server.
//!
//! | Method & path                         | Request        | Response         |
//! |---------------------------------------|----------------|------------------|
//! | `GET /health`                         | -              | [`HealthResponse`] |
//! | `POST /v1/projects/{id}/sync`         | [`PushRequest`] | [`PushResponse`] |
//! | `GET /v1/projects/{id}/files?since&limit` | -          | [`FilesPage`]    |
//! | `GET /v1/projects/{id}/status`        | -              | [`ProjectStatus`] |
//! | `DELETE /v1/projects/{id}`            | -              | [`DeleteResponse`] |
//!
//! File content always travels base64-encoded so binary files survive the
//! JSON text transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{FileRecord, ProjectStats};

/// Maximum number of records returned by one files page.
pub const PAGE_LIMIT: usize = 100;

/// Encodes file bytes for transport.
pub fn encode_content(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes transported file content.
pub fn decode_content(path: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| Error::InvalidContent {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

/// Response to `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// One file in a push batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub path: String,
    pub checksum: String,
    pub modified: i64,
    pub size: u64,
    /// Base64-encoded file bytes.
    pub content: String,
}

impl FileUpload {
    /// Builds an upload from raw bytes, encoding the content and taking the
    /// size from the byte length.
    pub fn from_bytes(
        path: impl Into<String>,
        bytes: &[u8],
        checksum: impl Into<String>,
        modified: i64,
    ) -> Self {
        FileUpload {
            path: path.into(),
            checksum: checksum.into(),
            modified,
            size: bytes.len() as u64,
            content: encode_content(bytes),
        }
    }
}

/// Body of `POST /v1/projects/{id}/sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    #[serde(default)]
    pub files: Vec<FileUpload>,
    /// Paths to remove from the remote snapshot.
    #[serde(default)]
    pub deletions: Vec<String>,
    /// Free-form caller metadata, passed through and logged by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Response to a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    pub synced: usize,
    pub deleted: usize,
    /// Paths the server refused to overwrite. Always empty under
    /// last-write-wins, kept for protocol compatibility.
    #[serde(default)]
    pub conflicts: Vec<String>,
}

/// One file in a files page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub path: String,
    /// Base64-encoded file bytes.
    pub content: String,
    pub checksum: String,
    pub modified: i64,
    pub size: u64,
    /// Absent in responses from older servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<i64>,
}

impl From<&FileRecord> for RemoteFile {
    fn from(record: &FileRecord) -> Self {
        RemoteFile {
            path: record.path.clone(),
            content: encode_content(&record.content),
            checksum: record.checksum.clone(),
            modified: record.modified,
            size: record.size,
            synced_at: Some(record.synced_at),
        }
    }
}

impl RemoteFile {
    /// Cursor value for the page that ends with this file.
    ///
    /// Falls back to `modified` for servers that do not report `syncedAt`.
    pub fn cursor(&self) -> i64 {
        self.synced_at.unwrap_or(self.modified)
    }
}

/// Response to `GET /v1/projects/{id}/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesPage {
    #[serde(default)]
    pub files: Vec<RemoteFile>,
    /// A response without `hasMore` reads as `false`.
    #[serde(default)]
    pub has_more: bool,
}

/// Query string of `GET /v1/projects/{id}/files`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesQuery {
    #[serde(default)]
    pub since: i64,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl FilesQuery {
    /// Effective page size, clamped to `1..=PAGE_LIMIT`.
    pub fn page_size(&self) -> usize {
        self.limit.unwrap_or(PAGE_LIMIT).clamp(1, PAGE_LIMIT)
    }
}

/// Response to `GET /v1/projects/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    pub last_sync: Option<i64>,
    pub file_count: u64,
}

impl From<ProjectStats> for ProjectStatus {
    fn from(stats: ProjectStats) -> Self {
        ProjectStatus {
            last_sync: stats.last_sync,
            file_count: stats.file_count,
        }
    }
}

/// Response to `DELETE /v1/projects/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: usize,
}

/// Body of every non-2xx response from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
