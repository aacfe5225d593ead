// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! km-core: Shared library for kamisync file synchronization
//!
//! This crate provides the file snapshot data model, the JSON wire protocol,
//! and the SQLite file store used by both the `kamisync` client and the
//! `km-remote` server.

pub mod clock;
pub mod error;
pub mod protocol;
pub mod record;
pub mod store;

pub use clock::{ClockSource, SyncClock, SystemClock};
pub use error::{Error, Result};
pub use protocol::{
    DeleteResponse, ErrorBody, FileUpload, FilesPage, FilesQuery, HealthResponse, ProjectStatus,
    PushRequest, PushResponse, RemoteFile, PAGE_LIMIT,
};
pub use record::{FileRecord, ProjectStats};
pub use store::{BatchOutcome, FileStore};
