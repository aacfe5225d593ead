// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push and pull of per-project file snapshots against a km-remote server.
//!
//! A push scans the sync root, diffs it against [`SyncState`], and sends
//! one batch. A pull walks the server's pages from the saved cursor and
//! writes each file back under the root:
//!
//! ```text
//! scan_dir ──► plan_push ──► SyncClient::push_files ──► POST /v1/projects/{id}/sync
//!
//! SyncClient::pull_files ◄── GET /v1/projects/{id}/files?since=<cursor>
//!        │
//!        └──► resolve_pulled_path ──► write_pulled ──► SyncState::save
//! ```
//!
//! Requests go through the [`Transport`] trait; [`HttpTransport`] is the
//! reqwest implementation and tests substitute in-process transports.
//! Transient failures are retried per [`RetryPolicy`].

mod client;
mod local;
mod retry;
mod transport;

pub use client::{FileSnapshot, PulledFile, SyncClient, SyncConfig, SyncError, SyncResult};
pub use local::{
    plan_push, resolve_pulled_path, scan_dir, write_pulled, PushPlan, SyncScope, SyncState,
    SKIPPED_DIRS,
};
pub use retry::{RetryPolicy, RETRYABLE_STATUSES};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, Transport, TransportError, TransportResult,
};

#[cfg(test)]
pub(crate) mod test_helpers;
