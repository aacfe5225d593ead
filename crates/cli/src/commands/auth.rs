// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! API key commands. The key itself is never printed.

use std::io::BufRead;
use std::path::Path;

use super::Project;
use crate::credentials::{CredentialManager, DebugInfo, StorageMethod};
use crate::error::Result;

/// Store a key, reading it from stdin when not given.
pub fn set(start: &Path, key: Option<String>) -> Result<()> {
    let project = Project::open(start)?;
    let creds = project.credentials();
    let key = resolve_key(key)?;
    let method = creds.set_api_key(&key)?;
    println!("API key stored in {}", describe(method));
    warn_if_env_overrides(&creds);
    Ok(())
}

/// Replace the stored key.
pub fn update(start: &Path, key: Option<String>) -> Result<()> {
    let project = Project::open(start)?;
    let creds = project.credentials();
    let key = resolve_key(key)?;
    let method = creds.update_api_key(&key)?;
    println!("API key updated in {}", describe(method));
    warn_if_env_overrides(&creds);
    Ok(())
}

pub fn delete(start: &Path) -> Result<()> {
    let project = Project::open(start)?;
    let creds = project.credentials();
    if creds.delete_api_key() {
        println!("API key removed");
    } else {
        println!("No stored API key to remove");
    }
    if creds.storage_method() == Some(StorageMethod::Environment) {
        println!("note: KAMIFLOW_SYNC_API_KEY is still set in the environment");
    }
    Ok(())
}

pub fn status(start: &Path, json: bool) -> Result<()> {
    let project = Project::open(start)?;
    let info = project.credentials().debug_info();
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", format_status(&info));
    }
    Ok(())
}

/// Human-readable rendering of [`DebugInfo`].
pub fn format_status(info: &DebugInfo) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let mut out = String::new();
    out.push_str(&format!("Project: {}\n", info.project_id));
    out.push_str(&format!(
        "Active key: {}\n",
        info.storage_method
            .map(describe)
            .unwrap_or("none configured")
    ));
    out.push_str(&format!("Environment variable set: {}\n", yes_no(info.env_var_set)));
    out.push_str(&format!(
        "Keychain: {}\n",
        info.keychain_backend.unwrap_or("unavailable")
    ));
    out.push_str(&format!(
        "Encrypted file: {} ({})\n",
        info.encrypted_file,
        if info.encrypted_file_exists {
            "present"
        } else {
            "absent"
        }
    ));
    if let Some(reason) = &info.corrupted {
        out.push_str(&format!("Warning: stored key is unreadable: {}\n", reason));
    }
    out
}

fn describe(method: StorageMethod) -> &'static str {
    match method {
        StorageMethod::Environment => "environment (KAMIFLOW_SYNC_API_KEY)",
        StorageMethod::Keychain => "system keychain",
        StorageMethod::EncryptedFile => "encrypted file",
    }
}

fn warn_if_env_overrides(creds: &CredentialManager) {
    if creds.storage_method() == Some(StorageMethod::Environment) {
        eprintln!("warning: KAMIFLOW_SYNC_API_KEY is set and takes priority over the stored key");
    }
}

/// Use the given key, or read the first line of stdin for `None` / `-`.
fn resolve_key(key: Option<String>) -> Result<String> {
    match key {
        Some(key) if key != "-" => Ok(key),
        _ => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim().to_string())
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
