// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync client for communicating with a km-remote server.
//!
//! Provides a high-level interface for:
//! - Checking server health
//! - Pushing file snapshots and deletions
//! - Pulling every file changed since a cursor, page by page
//! - Reading and deleting a project's remote state

use std::fmt;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde_json::Value;

use km_core::protocol::{decode_content, ErrorBody};
use km_core::{
    DeleteResponse, FileUpload, FilesPage, HealthResponse, ProjectStatus, PushRequest,
    PushResponse, PAGE_LIMIT,
};

use super::retry::RetryPolicy;
use super::transport::{HttpRequest, HttpTransport, Method, Transport, TransportError};

/// Characters escaped when a project ID is placed in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Configuration for the sync client.
#[derive(Clone)]
pub struct SyncConfig {
    /// Base URL of the remote server.
    pub url: String,
    /// Bearer secret, sent on every request when present.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl SyncConfig {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        SyncConfig {
            url: url.into(),
            api_key,
            timeout: HttpTransport::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Error type for sync client operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The server could not be reached or did not answer in time.
    #[error("{0}")]
    Connection(String),

    /// The server answered with a non-2xx status.
    ///
    /// `message` is the server's `error` field when present; `body` keeps
    /// the whole decoded response (a JSON string for non-JSON bodies).
    #[error("server returned HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Value,
    },

    /// A 2xx response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The server violated the paging contract.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The HTTP client could not be built.
    #[error("{0}")]
    Setup(String),
}

impl SyncError {
    /// The HTTP status, for server-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for sync client operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// A local file to push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Path relative to the sync root, `/`-separated.
    pub path: String,
    pub content: Vec<u8>,
    pub checksum: String,
    /// Modification time, ms since the Unix epoch.
    pub modified: i64,
}

/// A file received from a pull, content already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledFile {
    pub path: String,
    pub content: Vec<u8>,
    pub checksum: String,
    pub modified: i64,
    pub size: u64,
    /// Cursor value of this file (`syncedAt`, or `modified` from servers
    /// that do not report it).
    pub synced_at: i64,
}

/// Sync client for remote operations.
///
/// Requests are sequential; a client is built once per operation and its
/// URL and secret do not change afterwards.
pub struct SyncClient<T: Transport = HttpTransport> {
    config: SyncConfig,
    transport: T,
}

impl SyncClient<HttpTransport> {
    /// Create a new sync client with the default HTTP transport.
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        let transport =
            HttpTransport::new(config.timeout).map_err(|e| SyncError::Setup(e.to_string()))?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> SyncClient<T> {
    /// Create a new sync client with custom transport (for testing).
    pub fn with_transport(config: SyncConfig, transport: T) -> Self {
        SyncClient { config, transport }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// `GET /health`.
    pub async fn test_connection(&self) -> SyncResult<HealthResponse> {
        self.call(Method::Get, "/health", None).await
    }

    /// Upload files and deletions for a project in one batch.
    pub async fn push_files(
        &self,
        project_id: &str,
        files: &[FileSnapshot],
        deletions: &[String],
        metadata: Option<Value>,
    ) -> SyncResult<PushResponse> {
        let request = PushRequest {
            files: files
                .iter()
                .map(|f| FileUpload::from_bytes(&f.path, &f.content, &f.checksum, f.modified))
                .collect(),
            deletions: deletions.to_vec(),
            metadata,
        };
        let body = serde_json::to_value(&request).map_err(|e| SyncError::Decode(e.to_string()))?;
        tracing::debug!(
            project_id,
            files = files.len(),
            deletions = deletions.len(),
            "pushing batch"
        );
        let path = format!("/v1/projects/{}/sync", encode_id(project_id));
        self.call(Method::Post, &path, Some(body)).await
    }

    /// Fetch every file with a cursor greater than `since`.
    ///
    /// Follows `hasMore` page by page. A page without `hasMore` is the last
    /// page, as is an empty page.
    pub async fn pull_files(&self, project_id: &str, since: i64) -> SyncResult<Vec<PulledFile>> {
        let mut cursor = since;
        let mut pulled = Vec::new();

        loop {
            let path = format!(
                "/v1/projects/{}/files?since={}&limit={}",
                encode_id(project_id),
                cursor,
                PAGE_LIMIT
            );
            let page: FilesPage = self.call(Method::Get, &path, None).await?;
            let Some(last) = page.files.last() else {
                break;
            };
            let next = last.cursor();
            tracing::debug!(project_id, cursor, count = page.files.len(), "received page");

            for file in page.files {
                let content = decode_content(&file.path, &file.content)
                    .map_err(|e| SyncError::Decode(e.to_string()))?;
                let synced_at = file.cursor();
                pulled.push(PulledFile {
                    path: file.path,
                    content,
                    checksum: file.checksum,
                    modified: file.modified,
                    size: file.size,
                    synced_at,
                });
            }

            if !page.has_more {
                break;
            }
            if next <= cursor {
                return Err(SyncError::Protocol(format!(
                    "cursor did not advance past {cursor} while more pages remain"
                )));
            }
            cursor = next;
        }

        Ok(pulled)
    }

    /// `GET /v1/projects/{id}/status`.
    pub async fn get_project_status(&self, project_id: &str) -> SyncResult<ProjectStatus> {
        let path = format!("/v1/projects/{}/status", encode_id(project_id));
        self.call(Method::Get, &path, None).await
    }

    /// `DELETE /v1/projects/{id}`.
    pub async fn delete_project(&self, project_id: &str) -> SyncResult<DeleteResponse> {
        let path = format!("/v1/projects/{}", encode_id(project_id));
        self.call(Method::Delete, &path, None).await
    }

    /// Send a request to `path` (relative to the base URL) and return the
    /// parsed JSON body of a 2xx response.
    ///
    /// Retries per the configured [`RetryPolicy`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> SyncResult<Value> {
        let request = HttpRequest {
            method,
            url: self.url_for(path),
            bearer: self.config.api_key.clone(),
            body,
        };
        let policy = &self.config.retry;
        let mut attempt = 1;

        loop {
            match self.send_once(request.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < policy.max_attempts && policy.is_retryable(&e) => {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        %method,
                        url = %request.url,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> SyncResult<R> {
        let value = self.request(method, path, body).await?;
        serde_json::from_value(value).map_err(|e| SyncError::Decode(e.to_string()))
    }

    async fn send_once(&self, request: HttpRequest) -> SyncResult<Value> {
        let method = request.method;
        let url = request.url.clone();
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| connection_error(method, &url, e))?;

        if !response.is_success() {
            let (message, body) = error_parts(&response.body);
            return Err(SyncError::Http {
                status: response.status,
                message,
                body,
            });
        }
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| SyncError::Decode(e.to_string()))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }
}

fn encode_id(project_id: &str) -> String {
    utf8_percent_encode(project_id, PATH_SEGMENT).to_string()
}

fn connection_error(method: Method, url: &str, e: TransportError) -> SyncError {
    match e {
        TransportError::Setup(msg) => SyncError::Setup(msg),
        other => SyncError::Connection(format!("{method} {url} failed: {other}")),
    }
}

/// Splits an error response into its message and decoded body, preferring
/// the server's `{"error": ...}` message over the raw text.
fn error_parts(raw: &str) -> (String, Value) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (String::new(), Value::Null);
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(body) => {
            let message = match serde_json::from_value::<ErrorBody>(body.clone()) {
                Ok(parsed) => parsed.error,
                Err(_) => trimmed.to_string(),
            };
            (message, body)
        }
        Err(_) => (trimmed.to_string(), Value::String(trimmed.to_string())),
    }
}
