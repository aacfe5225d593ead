// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The local side of a sync: scanning the sync directory, deciding what to
//! push, writing pulled files, and remembering the cursor between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use km_core::record::validate_path;

use super::client::{FileSnapshot, PulledFile};
use crate::error::{Error, Result};
use crate::id::checksum;

/// Directory names never synced, at any depth.
pub const SKIPPED_DIRS: [&str; 2] = [".kamiflow", ".git"];

/// Persisted between runs in `.kamiflow/sync/state.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Highest `syncedAt` seen by a pull.
    #[serde(default)]
    pub cursor: i64,
    /// Checksum of every path as of the last push or pull.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl SyncState {
    /// Loads state, treating a missing file as a fresh start.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SyncState::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Advances the cursor; it never moves backwards.
    pub fn observe_cursor(&mut self, cursor: i64) {
        self.cursor = self.cursor.max(cursor);
    }
}

/// Files to upload and paths to delete for one push.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PushPlan {
    pub uploads: Vec<FileSnapshot>,
    pub deletions: Vec<String>,
}

impl PushPlan {
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.deletions.is_empty()
    }
}

/// The part of the project a push or pull touches.
///
/// Paths are always relative to the project root; a scope only narrows
/// which of them are scanned, written, or considered for deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncScope {
    prefix: Option<String>,
}

impl SyncScope {
    /// The whole project.
    pub fn all() -> Self {
        SyncScope::default()
    }

    /// The subtree at `prefix`, a `/`-separated path relative to the root.
    pub fn subtree(prefix: &str) -> Result<Self> {
        check_relative(prefix)?;
        Ok(SyncScope {
            prefix: Some(prefix.to_string()),
        })
    }

    pub fn is_all(&self) -> bool {
        self.prefix.is_none()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Whether a root-relative path lies inside this scope.
    pub fn contains(&self, path: &str) -> bool {
        match &self.prefix {
            None => true,
            Some(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }

    /// The directory this scope covers under `root`.
    pub fn dir(&self, root: &Path) -> PathBuf {
        match &self.prefix {
            None => root.to_path_buf(),
            Some(prefix) => join_relative(root, prefix),
        }
    }
}

/// Reads every regular file of `scope`, skipping [`SKIPPED_DIRS`].
///
/// Paths are relative to `root` and `/`-separated. Symlinks are not
/// followed; entries with non-UTF-8 names are skipped with a warning.
pub fn scan_dir(root: &Path, scope: &SyncScope) -> Result<Vec<FileSnapshot>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(scope.dir(root))
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry.depth() > 0
                && SKIPPED_DIRS.iter().any(|d| entry.file_name() == *d))
        });

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = relative_path(root, entry.path()) else {
            tracing::warn!(path = %entry.path().display(), "skipping file with non-UTF-8 name");
            continue;
        };
        let content = fs::read(entry.path())?;
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
            .unwrap_or(0);
        files.push(FileSnapshot {
            checksum: checksum(&content),
            path,
            content,
            modified,
        });
    }

    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Compares a scan of `scope` with the last synced state.
///
/// Files whose checksum changed (or that are new) are uploaded; paths in
/// `scope` that were synced before and no longer exist are deleted.
pub fn plan_push(
    scanned: Vec<FileSnapshot>,
    state: &SyncState,
    scope: &SyncScope,
) -> PushPlan {
    let present: std::collections::HashSet<&str> =
        scanned.iter().map(|f| f.path.as_str()).collect();
    let deletions = state
        .files
        .keys()
        .filter(|path| scope.contains(path) && !present.contains(path.as_str()))
        .cloned()
        .collect();
    let uploads = scanned
        .into_iter()
        .filter(|f| state.files.get(&f.path) != Some(&f.checksum))
        .collect();
    PushPlan { uploads, deletions }
}

/// Resolves a remote path under `root`, refusing anything that would land
/// outside it or inside a skipped directory.
pub fn resolve_pulled_path(root: &Path, path: &str) -> Result<PathBuf> {
    check_relative(path)?;
    Ok(join_relative(root, path))
}

fn check_relative(path: &str) -> Result<()> {
    validate_path(path).map_err(|_| Error::UnsafePath(path.to_string()))?;
    if path.split('/').any(|seg| seg == "." || SKIPPED_DIRS.contains(&seg)) {
        return Err(Error::UnsafePath(path.to_string()));
    }
    Ok(())
}

fn join_relative(root: &Path, path: &str) -> PathBuf {
    let mut target = root.to_path_buf();
    for segment in path.split('/') {
        target.push(segment);
    }
    target
}

/// Writes a pulled file under `root`, creating parent directories.
pub fn write_pulled(root: &Path, file: &PulledFile) -> Result<PathBuf> {
    let target = resolve_pulled_path(root, &file.path)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, &file.content)?;
    Ok(target)
}
