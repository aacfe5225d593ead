// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Secret storage backends.
//!
//! The OS keychain is optional at build time (cargo feature `keychain`) and
//! at run time ([`detect_keychain`]). Callers only see the [`SecretStore`]
//! trait, so tests substitute an in-memory store.

use thiserror::Error;

use crate::env;

/// Keychain service under which every project's secret is stored.
pub const SERVICE_NAME: &str = "kamiflow-sync";

/// Errors from a secret storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("secret store unavailable: {0}")]
    Unavailable(String),

    #[error("secret store failed: {0}")]
    Backend(String),

    #[error("stored secret is unreadable: {0}")]
    Corrupted(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A place secrets can be stored, keyed by `(service, account)`.
pub trait SecretStore: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Returns the stored secret, or `None` if no entry exists.
    fn get(&self, service: &str, account: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), StoreError>;

    /// Removes the entry. Returns `true` if one existed.
    fn delete(&self, service: &str, account: &str) -> Result<bool, StoreError>;
}

/// Returns the native keychain if it is compiled in, not disabled through
/// `KAMIFLOW_SYNC_NO_KEYCHAIN`, and answers a test read.
pub fn detect_keychain() -> Option<Box<dyn SecretStore>> {
    if env::no_keychain() {
        tracing::debug!("keychain disabled by environment");
        return None;
    }
    native_keychain()
}

#[cfg(feature = "keychain")]
fn native_keychain() -> Option<Box<dyn SecretStore>> {
    match native::NativeKeychain::detect() {
        Ok(keychain) => Some(Box::new(keychain)),
        Err(e) => {
            tracing::debug!(error = %e, "keychain unavailable");
            None
        }
    }
}

#[cfg(not(feature = "keychain"))]
fn native_keychain() -> Option<Box<dyn SecretStore>> {
    None
}

#[cfg(feature = "keychain")]
pub use native::NativeKeychain;

#[cfg(feature = "keychain")]
mod native {
    use super::{SecretStore, StoreError, SERVICE_NAME};

    const CHECK_ACCOUNT: &str = "__kamisync_check__";

    /// The platform credential store (macOS Keychain, Windows Credential
    /// Manager, Linux kernel keyring).
    #[derive(Debug, Default)]
    pub struct NativeKeychain;

    impl NativeKeychain {
        /// Checks that the platform store answers a lookup. A missing entry
        /// means the keychain works; nothing is written.
        pub fn detect() -> Result<Self, StoreError> {
            let entry = keyring::Entry::new(SERVICE_NAME, CHECK_ACCOUNT)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            match entry.get_password() {
                Ok(_) | Err(keyring::Error::NoEntry) => Ok(NativeKeychain),
                Err(e) => Err(StoreError::Unavailable(e.to_string())),
            }
        }

        fn entry(service: &str, account: &str) -> Result<keyring::Entry, StoreError> {
            keyring::Entry::new(service, account).map_err(|e| StoreError::Backend(e.to_string()))
        }
    }

    impl SecretStore for NativeKeychain {
        fn name(&self) -> &'static str {
            "native-keychain"
        }

        fn get(&self, service: &str, account: &str) -> Result<Option<String>, StoreError> {
            match Self::entry(service, account)?.get_password() {
                Ok(secret) => Ok(Some(secret)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(keyring::Error::BadEncoding(_)) => {
                    Err(StoreError::Corrupted("keychain entry is not UTF-8".to_string()))
                }
                Err(e) => Err(StoreError::Backend(e.to_string())),
            }
        }

        fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), StoreError> {
            Self::entry(service, account)?
                .set_password(secret)
                .map_err(|e| StoreError::Backend(e.to_string()))
        }

        fn delete(&self, service: &str, account: &str) -> Result<bool, StoreError> {
            match Self::entry(service, account)?.delete_credential() {
                Ok(()) => Ok(true),
                Err(keyring::Error::NoEntry) => Ok(false),
                Err(e) => Err(StoreError::Backend(e.to_string())),
            }
        }
    }
}
