// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote sync commands.
//!
//! Each command builds one client, runs its requests sequentially, and
//! saves the local sync state only after the server accepted the change.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::Project;
use crate::error::{Error, Result};
use crate::id::checksum;
use crate::sync::{
    plan_push, resolve_pulled_path, scan_dir, write_pulled, SyncClient, SyncScope, SyncState,
    Transport,
};

/// Counts reported by a push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushSummary {
    pub scanned: usize,
    pub synced: usize,
    pub deleted: usize,
}

/// Outcome of a pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullSummary {
    pub written: usize,
    /// Files already identical on disk.
    pub unchanged: usize,
    /// Paths edited locally since the last sync; the remote version was not
    /// applied and the next push uploads the local one.
    pub conflicts: Vec<String>,
    pub cursor: i64,
}

pub async fn health(start: &Path) -> Result<()> {
    let project = Project::open(start)?;
    let client = project.client()?;
    let health = client.test_connection().await?;
    println!(
        "Server {}: {} (version {})",
        client.config().url,
        health.status,
        health.version
    );
    Ok(())
}

pub async fn push(start: &Path, dir: Option<&Path>) -> Result<()> {
    let project = Project::open(start)?;
    let scope = project.sync_scope(start, dir)?;
    let client = project.client()?;
    let summary = push_dir(
        &client,
        &project.project_id,
        &project.root(),
        &scope,
        &project.state_path(),
    )
    .await?;
    if summary.synced == 0 && summary.deleted == 0 {
        println!("Nothing to push ({} files up to date)", summary.scanned);
    } else {
        println!(
            "Pushed {} files, deleted {} remote files",
            summary.synced, summary.deleted
        );
    }
    Ok(())
}

pub async fn pull(start: &Path, dir: Option<&Path>, full: bool) -> Result<()> {
    let project = Project::open(start)?;
    let scope = project.sync_scope(start, dir)?;
    let root = project.root();
    let client = project.client()?;
    let summary = pull_dir(
        &client,
        &project.project_id,
        &root,
        &scope,
        &project.state_path(),
        full,
    )
    .await?;
    for path in &summary.conflicts {
        eprintln!("warning: {path} changed locally, kept the local version");
    }
    println!(
        "Pulled {} files into {} ({} unchanged, {} conflicts)",
        summary.written,
        root.display(),
        summary.unchanged,
        summary.conflicts.len()
    );
    Ok(())
}

pub async fn status(start: &Path) -> Result<()> {
    let project = Project::open(start)?;
    let state = SyncState::load(&project.state_path())?;
    let client = project.client()?;
    let remote = client.get_project_status(&project.project_id).await?;

    println!("Project: {}", project.project_id);
    println!("Remote: {}", client.config().url);
    println!("Remote files: {}", remote.file_count);
    println!("Last remote sync: {}", format_ms(remote.last_sync));
    println!("Local cursor: {}", format_ms(Some(state.cursor).filter(|c| *c > 0)));
    println!("Tracked files: {}", state.files.len());
    Ok(())
}

pub async fn delete_remote(start: &Path, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::ConfirmationRequired {
            action: "delete-remote",
        });
    }
    let project = Project::open(start)?;
    let client = project.client()?;
    let response = client.delete_project(&project.project_id).await?;
    SyncState::default().save(&project.state_path())?;
    println!("Deleted {} remote files", response.deleted);
    Ok(())
}

/// Push every new or changed file in `scope` plus deletions of files in
/// `scope` pushed before and now missing.
///
/// Paths are relative to `root` whatever the scope. The whole batch is one
/// request; the state file is only rewritten after the server accepted it.
pub async fn push_dir<T: Transport>(
    client: &SyncClient<T>,
    project_id: &str,
    root: &Path,
    scope: &SyncScope,
    state_path: &Path,
) -> Result<PushSummary> {
    let mut state = SyncState::load(state_path)?;
    let scanned = scan_dir(root, scope)?;
    let current: BTreeMap<String, String> = scanned
        .iter()
        .map(|f| (f.path.clone(), f.checksum.clone()))
        .collect();
    let scanned_count = scanned.len();
    let plan = plan_push(scanned, &state, scope);

    if plan.is_empty() {
        return Ok(PushSummary {
            scanned: scanned_count,
            ..PushSummary::default()
        });
    }

    let metadata = json!({
        "client": "kamisync",
        "version": env!("CARGO_PKG_VERSION"),
        "hostname": gethostname::gethostname().to_string_lossy(),
    });
    let response = client
        .push_files(project_id, &plan.uploads, &plan.deletions, Some(metadata))
        .await?;
    if !response.conflicts.is_empty() {
        tracing::warn!(conflicts = ?response.conflicts, "server reported conflicts");
    }

    state.files.retain(|path, _| !scope.contains(path));
    state.files.extend(current);
    state.save(state_path)?;

    Ok(PushSummary {
        scanned: scanned_count,
        synced: response.synced,
        deleted: response.deleted,
    })
}

/// Pull files changed since the saved cursor (or everything when `full`)
/// and write the ones in `scope` under `root`.
///
/// Every path is checked before anything is written, so a response with
/// one unsafe path writes nothing. A local file whose checksum differs
/// from the last synced one is a conflict and is left untouched. The
/// saved cursor only advances for whole-project pulls, so files outside a
/// narrower scope are still fetched by a later pull.
pub async fn pull_dir<T: Transport>(
    client: &SyncClient<T>,
    project_id: &str,
    root: &Path,
    scope: &SyncScope,
    state_path: &Path,
    full: bool,
) -> Result<PullSummary> {
    let mut state = SyncState::load(state_path)?;
    let since = if full { 0 } else { state.cursor };
    let files = client.pull_files(project_id, since).await?;

    for file in &files {
        resolve_pulled_path(root, &file.path)?;
    }

    let mut summary = PullSummary::default();
    for file in files.iter().filter(|f| scope.contains(&f.path)) {
        let remote_sum = checksum(&file.content);
        match local_checksum(&resolve_pulled_path(root, &file.path)?)? {
            Some(local) if local == remote_sum => summary.unchanged += 1,
            Some(local) if state.files.get(&file.path) != Some(&local) => {
                tracing::warn!(path = %file.path, "local edit conflicts with remote version");
                summary.conflicts.push(file.path.clone());
                continue;
            }
            _ => {
                write_pulled(root, file)?;
                summary.written += 1;
            }
        }
        state.files.insert(file.path.clone(), remote_sum);
    }
    if scope.is_all() {
        for file in &files {
            state.observe_cursor(file.synced_at);
        }
    }
    state.save(state_path)?;
    summary.cursor = state.cursor;

    tracing::info!(
        project_id,
        written = summary.written,
        unchanged = summary.unchanged,
        conflicts = summary.conflicts.len(),
        cursor = state.cursor,
        "pull complete"
    );
    Ok(summary)
}

/// Checksum of the file at `path`, or `None` if it does not exist.
fn local_checksum(path: &Path) -> Result<Option<String>> {
    match std::fs::read(path) {
        Ok(content) => Ok(Some(checksum(&content))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn format_ms(ms: Option<i64>) -> String {
    match ms.and_then(DateTime::<Utc>::from_timestamp_millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "never".to_string(),
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
