// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Owns the file store for the lifetime of the process and serializes
//! writers through a single mutex.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use km_core::record::validate_project_id;
use km_core::{
    DeleteResponse, FileStore, FilesPage, FilesQuery, ProjectStatus, PushRequest, PushResponse,
    RemoteFile, Result,
};

/// Shared server state containing the file store and the bearer key.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    store: Mutex<FileStore>,
    /// Bearer key required on `/v1` routes; `None` disables the check.
    api_key: Option<String>,
}

impl ServerState {
    /// Opens the store at `db_path`, creating it if needed.
    pub fn open(db_path: &Path, api_key: Option<String>) -> Result<Self> {
        let store = FileStore::open(db_path)?;
        Ok(Self::with_store(store, api_key))
    }

    pub fn with_store(store: FileStore, api_key: Option<String>) -> Self {
        ServerState {
            inner: Arc::new(ServerStateInner {
                store: Mutex::new(store),
                api_key,
            }),
        }
    }

    /// Whether a request carrying `bearer` may use the `/v1` routes.
    pub fn authorize(&self, bearer: Option<&str>) -> bool {
        match &self.inner.api_key {
            None => true,
            Some(expected) => bearer == Some(expected.as_str()),
        }
    }

    /// Applies a push batch atomically.
    pub async fn push(&self, project_id: &str, request: PushRequest) -> Result<PushResponse> {
        if let Some(metadata) = &request.metadata {
            info!(project_id, %metadata, "push metadata");
        }
        let mut store = self.inner.store.lock().await;
        let outcome = store.apply_batch(project_id, &request.files, &request.deletions)?;
        info!(
            project_id,
            synced = outcome.synced,
            deleted = outcome.deleted,
            "push applied"
        );
        Ok(PushResponse {
            synced: outcome.synced,
            deleted: outcome.deleted,
            conflicts: Vec::new(),
        })
    }

    /// One page of files changed after `query.since`.
    ///
    /// Fetches one row past the page size to learn whether more remain.
    pub async fn files_page(&self, project_id: &str, query: FilesQuery) -> Result<FilesPage> {
        validate_project_id(project_id)?;
        let limit = query.page_size();
        let mut records = {
            let store = self.inner.store.lock().await;
            store.files_since(project_id, query.since, limit + 1)?
        };
        let has_more = records.len() > limit;
        records.truncate(limit);
        Ok(FilesPage {
            files: records.iter().map(RemoteFile::from).collect(),
            has_more,
        })
    }

    pub async fn status(&self, project_id: &str) -> Result<ProjectStatus> {
        validate_project_id(project_id)?;
        let store = self.inner.store.lock().await;
        Ok(store.get_project_stats(project_id)?.into())
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<DeleteResponse> {
        validate_project_id(project_id)?;
        let deleted = self.inner.store.lock().await.delete_project(project_id)?;
        info!(project_id, deleted, "project deleted");
        Ok(DeleteResponse { deleted })
    }

    /// Closes the store if this is the last handle to it.
    pub fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.inner) {
            Ok(inner) => inner.store.into_inner().close(),
            Err(_) => {
                warn!("store still referenced at shutdown, closing on drop");
                Ok(())
            }
        }
    }
}
