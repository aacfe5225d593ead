// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

mod common;
use common::*;

#[test]
fn set_stores_key_in_encrypted_file() {
    let temp = init_temp();

    kamisync()
        .args(["auth", "set", "sk-test-123"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("encrypted file"));

    let path = temp.path().join(".kamiflow/sync/credentials.enc");
    let stored = std::fs::read_to_string(path).unwrap();
    assert!(!stored.contains("sk-test-123"));
}

#[test]
fn set_reads_key_from_stdin() {
    let temp = init_temp();

    kamisync()
        .args(["auth", "set", "-"])
        .write_stdin("sk-from-stdin\n")
        .current_dir(temp.path())
        .assert()
        .success();

    kamisync()
        .args(["auth", "status", "--json"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"storage_method\": \"encrypted-file\""));
}

#[test]
fn set_rejects_empty_key() {
    let temp = init_temp();

    kamisync()
        .args(["auth", "set", "   "])
        .current_dir(temp.path())
        .assert()
        .failure();
}

#[test]
fn status_without_key() {
    let temp = init_temp();

    kamisync()
        .args(["auth", "status"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Active key: none configured"))
        .stdout(predicate::str::contains("Keychain: unavailable"));
}

#[test]
fn status_json_never_prints_key() {
    let temp = init_temp();

    kamisync()
        .args(["auth", "set", "sk-secret-value"])
        .current_dir(temp.path())
        .assert()
        .success();

    let output = kamisync()
        .args(["auth", "status", "--json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("sk-secret-value"));
    let info: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(info["encrypted_file_exists"], true);
    assert_eq!(info["env_var_set"], false);
}

#[test]
fn env_var_takes_priority() {
    let temp = init_temp();

    kamisync()
        .args(["auth", "set", "sk-stored"])
        .current_dir(temp.path())
        .assert()
        .success();

    kamisync()
        .args(["auth", "status"])
        .env("KAMIFLOW_SYNC_API_KEY", "sk-env")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Active key: environment"));
}

#[test]
fn update_replaces_key() {
    let temp = init_temp();

    kamisync()
        .args(["auth", "set", "sk-old"])
        .current_dir(temp.path())
        .assert()
        .success();

    kamisync()
        .args(["auth", "update", "sk-new"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("API key updated"));
}

#[test]
fn delete_removes_key() {
    let temp = init_temp();

    kamisync()
        .args(["auth", "set", "sk-test"])
        .current_dir(temp.path())
        .assert()
        .success();

    kamisync()
        .args(["auth", "delete"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("API key removed"));

    assert!(!temp.path().join(".kamiflow/sync/credentials.enc").exists());

    kamisync()
        .args(["auth", "delete"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored API key"));
}

#[test]
fn corrupted_file_reported_in_status() {
    let temp = init_temp();
    std::fs::write(
        temp.path().join(".kamiflow/sync/credentials.enc"),
        "not an envelope",
    )
    .unwrap();

    kamisync()
        .args(["auth", "status"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("stored key is unreadable"));
}
