// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod auth;
pub mod init;
pub mod sync;

use std::path::{Component, Path, PathBuf};

use crate::config::{credentials_path, find_work_dir_from, project_root, state_path, Config};
use crate::credentials::{CredentialLookup, CredentialManager};
use crate::error::{Error, Result};
use crate::sync::{SyncClient, SyncConfig, SyncScope};

/// An initialized project, located by walking up from the start directory.
#[derive(Debug)]
pub struct Project {
    pub work_dir: PathBuf,
    pub config: Config,
    pub project_id: String,
}

impl Project {
    /// Finds and loads the project containing `start`, generating its
    /// project ID on first use.
    pub fn open(start: &Path) -> Result<Self> {
        let work_dir = find_work_dir_from(start)?;
        let mut config = Config::load(&work_dir)?;
        let project_id = config.ensure_project_id(&work_dir)?;
        Ok(Project {
            work_dir,
            config,
            project_id,
        })
    }

    pub fn credentials(&self) -> CredentialManager {
        CredentialManager::new(&self.project_id, &credentials_path(&self.work_dir))
    }

    pub fn state_path(&self) -> PathBuf {
        state_path(&self.work_dir)
    }

    /// The project root; every synced path is relative to it.
    pub fn root(&self) -> PathBuf {
        project_root(&self.work_dir)
    }

    /// The part of the project to sync: `dir` (relative to `start`) or the
    /// whole project.
    ///
    /// `dir` must lie inside the project root. It narrows the scan; it never
    /// changes the paths files are stored under.
    pub fn sync_scope(&self, start: &Path, dir: Option<&Path>) -> Result<SyncScope> {
        let Some(dir) = dir else {
            return Ok(SyncScope::all());
        };
        let target = normalize(&start.join(dir));
        let root = normalize(&self.root());
        let relative = target
            .strip_prefix(&root)
            .map_err(|_| Error::UnsafePath(dir.display().to_string()))?;
        let parts = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::UnsafePath(dir.display().to_string()))?;
        if parts.is_empty() {
            return Ok(SyncScope::all());
        }
        SyncScope::subtree(&parts.join("/"))
    }

    /// Builds the client for this project's remote with the resolved key.
    ///
    /// A missing key is allowed; servers without an API key accept
    /// unauthenticated requests.
    pub fn client(&self) -> Result<SyncClient> {
        let remote = self.config.effective_remote()?;
        let api_key = match self.credentials().lookup() {
            CredentialLookup::Found { secret, source } => {
                tracing::debug!(%source, "resolved api key");
                Some(secret)
            }
            CredentialLookup::NotConfigured => None,
            CredentialLookup::StorageCorrupted { reason } => {
                return Err(Error::CredentialsCorrupted(reason))
            }
        };
        let config = SyncConfig {
            url: remote.url.clone(),
            api_key,
            timeout: remote.timeout(),
            retry: remote.retry_policy(),
        };
        Ok(SyncClient::new(config)?)
    }
}

/// Resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
