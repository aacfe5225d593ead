// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed file snapshot store.
//!
//! [`FileStore`] keeps one row per `(project_id, path)` and stamps every
//! write with a strictly increasing `synced_at`, which clients use as the
//! cursor for incremental pulls. The store is a single explicit handle:
//! open it once per process with [`FileStore::open`] and release it with
//! [`FileStore::close`].

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::clock::{ClockSource, SyncClock, SystemClock};
use crate::error::{Error, Result};
use crate::protocol::{decode_content, FileUpload, PAGE_LIMIT};
use crate::record::{validate_path, validate_project_id, FileRecord, ProjectStats};

/// SQL schema for the file store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    path TEXT NOT NULL,
    content BLOB NOT NULL,
    checksum TEXT NOT NULL,
    modified INTEGER NOT NULL,
    size INTEGER NOT NULL,
    synced_at INTEGER NOT NULL,
    UNIQUE (project_id, path)
);

CREATE INDEX IF NOT EXISTS idx_files_project ON files(project_id);
CREATE INDEX IF NOT EXISTS idx_files_modified ON files(modified);
CREATE INDEX IF NOT EXISTS idx_files_synced_at ON files(synced_at);
CREATE INDEX IF NOT EXISTS idx_files_project_synced ON files(project_id, synced_at);
"#;

const UPSERT_SQL: &str = "INSERT INTO files (project_id, path, content, checksum, modified, size, synced_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT (project_id, path) DO UPDATE SET
         content = excluded.content,
         checksum = excluded.checksum,
         modified = excluded.modified,
         size = excluded.size,
         synced_at = excluded.synced_at";

const SELECT_COLUMNS: &str = "project_id, path, content, checksum, modified, size, synced_at";

/// Counts produced by applying one push batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Files inserted or updated.
    pub synced: usize,
    /// Rows actually removed by the batch's deletions.
    pub deleted: usize,
}

/// Map a database row to a [`FileRecord`].
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    let size: i64 = row.get(5)?;
    let size = u64::try_from(size).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Integer,
            Box::new(Error::CorruptedData(format!("negative size {size}"))),
        )
    })?;
    Ok(FileRecord {
        project_id: row.get(0)?,
        path: row.get(1)?,
        content: row.get(2)?,
        checksum: row.get(3)?,
        modified: row.get(4)?,
        size,
        synced_at: row.get(6)?,
    })
}

fn size_to_sql(path: &str, size: u64) -> Result<i64> {
    i64::try_from(size).map_err(|_| Error::InvalidContent {
        path: path.to_string(),
        reason: format!("size {size} out of range"),
    })
}

/// SQLite file snapshot store with a monotonic write clock.
pub struct FileStore {
    conn: Connection,
    clock: SyncClock<Box<dyn ClockSource>>,
}

impl FileStore {
    /// Open the store at the given path, creating it and its schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_clock(path, SystemClock)
    }

    /// Open the store at the given path with a custom clock source.
    pub fn open_with_clock(path: &Path, clock: impl ClockSource + 'static) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a push transaction is writing
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        tracing::debug!(path = %path.display(), "opened file store");
        Self::init(conn, Box::new(clock))
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_clock(SystemClock)
    }

    /// Open an in-memory store with a custom clock source (for testing).
    pub fn open_in_memory_with_clock(clock: impl ClockSource + 'static) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, Box::new(clock))
    }

    fn init(conn: Connection, clock: Box<dyn ClockSource>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;

        let clock = SyncClock::with_clock(clock);
        let newest: Option<i64> =
            conn.query_row("SELECT MAX(synced_at) FROM files", [], |row| row.get(0))?;
        if let Some(newest) = newest {
            clock.observe(newest);
        }

        Ok(FileStore { conn, clock })
    }

    /// Close the underlying connection, flushing the WAL.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }

    /// Insert or overwrite the snapshot for `(project_id, path)`.
    ///
    /// Always assigns a fresh `synced_at`, even when the content and checksum
    /// are unchanged. Returns the assigned stamp.
    pub fn upsert_file(
        &self,
        project_id: &str,
        path: &str,
        content: &[u8],
        checksum: &str,
        modified: i64,
        size: u64,
    ) -> Result<i64> {
        validate_project_id(project_id)?;
        validate_path(path)?;
        let size = size_to_sql(path, size)?;
        let synced_at = self.clock.next();
        self.conn.execute(
            UPSERT_SQL,
            params![project_id, path, content, checksum, modified, size, synced_at],
        )?;
        Ok(synced_at)
    }

    /// Apply a whole push batch in one transaction.
    ///
    /// Every upload is validated and decoded before anything is written, and
    /// a failure part-way through rolls the batch back, so a batch is either
    /// fully applied or not at all.
    pub fn apply_batch(
        &mut self,
        project_id: &str,
        files: &[FileUpload],
        deletions: &[String],
    ) -> Result<BatchOutcome> {
        validate_project_id(project_id)?;

        let mut decoded = Vec::with_capacity(files.len());
        for file in files {
            validate_path(&file.path)?;
            let content = decode_content(&file.path, &file.content)?;
            decoded.push((file, content, size_to_sql(&file.path, file.size)?));
        }
        for path in deletions {
            validate_path(path)?;
        }

        let tx = self.conn.transaction()?;
        let mut outcome = BatchOutcome::default();
        {
            let mut upsert = tx.prepare_cached(UPSERT_SQL)?;
            for (file, content, size) in &decoded {
                let synced_at = self.clock.next();
                upsert.execute(params![
                    project_id,
                    file.path,
                    content,
                    file.checksum,
                    file.modified,
                    size,
                    synced_at
                ])?;
                outcome.synced += 1;
            }

            let mut delete =
                tx.prepare_cached("DELETE FROM files WHERE project_id = ?1 AND path = ?2")?;
            for path in deletions {
                outcome.deleted += delete.execute(params![project_id, path])?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            project_id,
            synced = outcome.synced,
            deleted = outcome.deleted,
            "applied push batch"
        );
        Ok(outcome)
    }

    /// Returns up to [`PAGE_LIMIT`] records with `synced_at > since`,
    /// ascending by `synced_at`.
    pub fn get_files_since(&self, project_id: &str, since: i64) -> Result<Vec<FileRecord>> {
        self.files_since(project_id, since, PAGE_LIMIT)
    }

    /// Returns up to `limit` records with `synced_at > since`, ascending by
    /// `synced_at`.
    pub fn files_since(
        &self,
        project_id: &str,
        since: i64,
        limit: usize,
    ) -> Result<Vec<FileRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM files
             WHERE project_id = ?1 AND synced_at > ?2
             ORDER BY synced_at ASC, id ASC
             LIMIT ?3"
        ))?;
        let records = stmt
            .query_map(params![project_id, since, limit], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Get the snapshot for one path, if present.
    pub fn get_file(&self, project_id: &str, path: &str) -> Result<Option<FileRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM files WHERE project_id = ?1 AND path = ?2"),
                params![project_id, path],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// File count and newest `synced_at` for a project.
    pub fn get_project_stats(&self, project_id: &str) -> Result<ProjectStats> {
        let (count, last_sync): (i64, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), MAX(synced_at) FROM files WHERE project_id = ?1",
            params![project_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(ProjectStats {
            file_count: u64::try_from(count).unwrap_or(0),
            last_sync,
        })
    }

    /// Remove one file. Returns whether a row was removed.
    pub fn delete_file(&self, project_id: &str, path: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM files WHERE project_id = ?1 AND path = ?2",
            params![project_id, path],
        )?;
        Ok(affected > 0)
    }

    /// Remove every file of a project. Returns the number of rows removed.
    pub fn delete_project(&self, project_id: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM files WHERE project_id = ?1", params![project_id])?;
        Ok(affected)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
