// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// A `kamisync` command isolated from the caller's environment.
///
/// The keychain is disabled so stored keys land in the encrypted file
/// inside the temp directory.
pub fn kamisync() -> Command {
    let mut cmd = cargo_bin_cmd!("kamisync");
    cmd.env("KAMIFLOW_SYNC_NO_KEYCHAIN", "1")
        .env_remove("KAMIFLOW_SYNC_API_KEY")
        .env_remove("KAMIFLOW_SYNC_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Initialize a temp directory with an (unreachable) remote.
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    kamisync()
        .args(["init", "--url", "http://127.0.0.1:9"])
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Initialize a temp directory without a remote.
pub fn init_temp_no_remote() -> TempDir {
    let temp = TempDir::new().unwrap();
    kamisync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}
