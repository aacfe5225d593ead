// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Generates `env_vars.rs`: one documented constant per environment
//! variable kamisync reads, included by `src/env.rs`.

use std::io::Write;

const VARS: &[(&str, &str)] = &[
    ("KAMIFLOW_SYNC_API_KEY", "API key; overrides keychain and file storage"),
    ("KAMIFLOW_SYNC_URL", "Sync server URL; overrides `[remote] url`"),
    ("KAMIFLOW_SYNC_NO_KEYCHAIN", "Set to skip the OS keychain"),
    ("RUST_LOG", "Log filter"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = std::env::var("OUT_DIR")?;
    let path = std::path::Path::new(&out_dir).join("env_vars.rs");
    let mut out = std::fs::File::create(path)?;

    for (name, doc) in VARS {
        writeln!(out, "/// {doc}")?;
        writeln!(out, "pub const {name}: &str = \"{name}\";")?;
    }

    Ok(())
}
