// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

mod common;
use common::*;

#[test]
fn push_without_remote_fails() {
    let temp = init_temp_no_remote();

    kamisync()
        .arg("push")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no remote configured"));
}

#[test]
fn url_env_var_supplies_remote() {
    let temp = init_temp_no_remote();

    // Port 9 (discard) is not expected to speak HTTP
    kamisync()
        .arg("health")
        .env("KAMIFLOW_SYNC_URL", "http://127.0.0.1:9")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("sync failed"));
}

#[test]
fn delete_remote_requires_yes() {
    let temp = init_temp();

    kamisync()
        .arg("delete-remote")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn corrupted_credentials_block_sync() {
    let temp = init_temp();
    std::fs::write(
        temp.path().join(".kamiflow/sync/credentials.enc"),
        "{\"version\":1,\"iv\":\"AAAA\",\"ciphertext\":\"AAAA\"}",
    )
    .unwrap();

    kamisync()
        .arg("status")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("stored credentials are unreadable"));
}
