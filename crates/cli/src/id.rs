// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sha2::{Digest, Sha256};

/// Length in bytes of a generated project ID (rendered as 32 hex chars).
pub const PROJECT_ID_BYTES: usize = 16;

/// Fill an array with bytes from the OS random source.
pub fn random_bytes<const N: usize>() -> std::io::Result<[u8; N]> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes).map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(bytes)
}

/// Generate a fresh project ID: 16 random bytes as lowercase hex.
pub fn generate_project_id() -> std::io::Result<String> {
    let bytes = random_bytes::<PROJECT_ID_BYTES>()?;
    Ok(hex::encode(bytes))
}

/// Validate that a project ID looks like one we generated.
///
/// Hand-edited configs may carry other IDs; the server accepts any
/// non-empty ID without `/`, so this is only used to warn.
pub fn is_generated_project_id(id: &str) -> bool {
    id.len() == PROJECT_ID_BYTES * 2
        && id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// SHA-256 of file content as lowercase hex.
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
