// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the value of `KAMIFLOW_SYNC_API_KEY` if set and non-empty.
///
/// This is the first credential tier, consulted ahead of any local storage.
pub fn sync_api_key() -> Option<String> {
    non_empty(vars::KAMIFLOW_SYNC_API_KEY)
}

/// Returns the value of `KAMIFLOW_SYNC_URL` if set and non-empty.
pub fn sync_url() -> Option<String> {
    non_empty(vars::KAMIFLOW_SYNC_URL)
}

/// Returns `true` if `KAMIFLOW_SYNC_NO_KEYCHAIN` is set (any value).
pub fn no_keychain() -> bool {
    std::env::var(vars::KAMIFLOW_SYNC_NO_KEYCHAIN).is_ok()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
