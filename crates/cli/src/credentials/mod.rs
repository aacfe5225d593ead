// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! API key management for the sync backend.
//!
//! A project's secret resolves from three tiers, strictly in order:
//!
//! 1. the `KAMIFLOW_SYNC_API_KEY` environment variable,
//! 2. the OS keychain entry `(kamiflow-sync, <project_id>)`,
//! 3. the encrypted file `.kamiflow/sync/credentials.enc`.
//!
//! Writes go to the keychain when it is available and fall through to the
//! encrypted file otherwise. The environment tier is read-only.

mod encrypted;
mod keychain;

pub use encrypted::{derive_key, machine_key, EncryptedFile, Envelope, SALT};
pub use keychain::{detect_keychain, SecretStore, StoreError, SERVICE_NAME};

#[cfg(feature = "keychain")]
pub use keychain::NativeKeychain;

use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::env;

/// Errors from credential writes. Reads never fail; see [`CredentialLookup`].
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key cannot be empty")]
    EmptyKey,

    #[error("failed to write credential file: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the active secret comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMethod {
    Environment,
    Keychain,
    EncryptedFile,
}

impl fmt::Display for StorageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMethod::Environment => write!(f, "environment"),
            StorageMethod::Keychain => write!(f, "keychain"),
            StorageMethod::EncryptedFile => write!(f, "encrypted-file"),
        }
    }
}

/// Outcome of resolving the project's secret.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialLookup {
    Found {
        secret: String,
        source: StorageMethod,
    },
    /// No tier holds a secret.
    NotConfigured,
    /// The encrypted file exists but cannot be decrypted.
    StorageCorrupted { reason: String },
}

impl CredentialLookup {
    /// Collapses the lookup to the secret, if any.
    pub fn into_secret(self) -> Option<String> {
        match self {
            CredentialLookup::Found { secret, .. } => Some(secret),
            _ => None,
        }
    }
}

impl fmt::Debug for CredentialLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialLookup::Found { source, .. } => f
                .debug_struct("Found")
                .field("source", source)
                .finish_non_exhaustive(),
            CredentialLookup::NotConfigured => write!(f, "NotConfigured"),
            CredentialLookup::StorageCorrupted { reason } => f
                .debug_struct("StorageCorrupted")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Credential introspection for `kamisync auth status`. Never holds the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugInfo {
    pub project_id: String,
    pub env_var_set: bool,
    pub keychain_available: bool,
    pub keychain_backend: Option<&'static str>,
    pub encrypted_file: String,
    pub encrypted_file_exists: bool,
    pub storage_method: Option<StorageMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrupted: Option<String>,
}

/// Resolves and stores the sync API key of one project.
pub struct CredentialManager {
    project_id: String,
    env_key: Option<String>,
    keychain: Option<Box<dyn SecretStore>>,
    file: EncryptedFile,
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("project_id", &self.project_id)
            .field("env_var_set", &self.env_key.is_some())
            .field("keychain", &self.keychain.as_ref().map(|k| k.name()))
            .field("file", &self.file)
            .finish()
    }
}

impl CredentialManager {
    /// Builds a manager from the process environment, the detected keychain,
    /// and the credential file at `credentials_path`.
    pub fn new(project_id: impl Into<String>, credentials_path: &Path) -> Self {
        Self::with_parts(
            project_id,
            env::sync_api_key(),
            detect_keychain(),
            EncryptedFile::new(credentials_path),
        )
    }

    /// Builds a manager from explicit tiers.
    pub fn with_parts(
        project_id: impl Into<String>,
        env_key: Option<String>,
        keychain: Option<Box<dyn SecretStore>>,
        file: EncryptedFile,
    ) -> Self {
        CredentialManager {
            project_id: project_id.into(),
            env_key: env_key.filter(|k| !k.trim().is_empty()),
            keychain,
            file,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Stores the key, preferring the keychain.
    ///
    /// Keychain failures are logged and fall through to the encrypted file.
    pub fn set_api_key(&self, key: &str) -> Result<StorageMethod, CredentialError> {
        let key = validate_key(key)?;
        if let Some(keychain) = &self.keychain {
            match keychain.set(SERVICE_NAME, &self.project_id, key) {
                Ok(()) => {
                    tracing::debug!(backend = keychain.name(), "stored api key in keychain");
                    return Ok(StorageMethod::Keychain);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "keychain write failed, using encrypted file");
                }
            }
        }
        self.set_api_key_fallback(key)?;
        Ok(StorageMethod::EncryptedFile)
    }

    /// Writes the key straight to the encrypted file tier.
    pub fn set_api_key_fallback(&self, key: &str) -> Result<(), CredentialError> {
        let key = validate_key(key)?;
        self.file.write(key)?;
        tracing::debug!(path = %self.file.path().display(), "stored api key in encrypted file");
        Ok(())
    }

    /// Reads the encrypted file tier only. Any failure reads as `None`.
    pub fn get_api_key_fallback(&self) -> Option<String> {
        match self.file.read() {
            Ok(secret) => secret,
            Err(e) => {
                tracing::warn!(error = %e, "credential file unreadable");
                None
            }
        }
    }

    /// Resolves the secret across all tiers.
    pub fn lookup(&self) -> CredentialLookup {
        if let Some(secret) = &self.env_key {
            return CredentialLookup::Found {
                secret: secret.clone(),
                source: StorageMethod::Environment,
            };
        }

        if let Some(keychain) = &self.keychain {
            match keychain.get(SERVICE_NAME, &self.project_id) {
                Ok(Some(secret)) => {
                    return CredentialLookup::Found {
                        secret,
                        source: StorageMethod::Keychain,
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "keychain read failed, trying encrypted file"),
            }
        }

        match self.file.read() {
            Ok(Some(secret)) => CredentialLookup::Found {
                secret,
                source: StorageMethod::EncryptedFile,
            },
            Ok(None) => CredentialLookup::NotConfigured,
            Err(e) => {
                tracing::warn!(error = %e, "credential file unreadable");
                CredentialLookup::StorageCorrupted {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The secret from the first tier that has one.
    pub fn get_api_key(&self) -> Option<String> {
        self.lookup().into_secret()
    }

    pub fn has_credentials(&self) -> bool {
        self.get_api_key().is_some()
    }

    /// Which tier the active secret comes from.
    pub fn storage_method(&self) -> Option<StorageMethod> {
        match self.lookup() {
            CredentialLookup::Found { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Removes the key from the keychain and the encrypted file.
    ///
    /// Returns `true` if anything was removed. The environment variable is
    /// left alone.
    pub fn delete_api_key(&self) -> bool {
        let mut removed = false;
        if let Some(keychain) = &self.keychain {
            match keychain.delete(SERVICE_NAME, &self.project_id) {
                Ok(existed) => removed |= existed,
                Err(e) => tracing::warn!(error = %e, "keychain delete failed"),
            }
        }
        match self.file.remove() {
            Ok(existed) => removed |= existed,
            Err(e) => tracing::warn!(error = %e, "failed to remove credential file"),
        }
        removed
    }

    /// Replaces the stored key.
    ///
    /// This is a delete followed by a set: if the set fails, the old key is
    /// already gone.
    pub fn update_api_key(&self, key: &str) -> Result<StorageMethod, CredentialError> {
        validate_key(key)?;
        self.delete_api_key();
        self.set_api_key(key)
    }

    /// Describes the credential setup without revealing the secret.
    pub fn debug_info(&self) -> DebugInfo {
        let lookup = self.lookup();
        let (storage_method, corrupted) = match lookup {
            CredentialLookup::Found { source, .. } => (Some(source), None),
            CredentialLookup::NotConfigured => (None, None),
            CredentialLookup::StorageCorrupted { reason } => (None, Some(reason)),
        };
        DebugInfo {
            project_id: self.project_id.clone(),
            env_var_set: self.env_key.is_some(),
            keychain_available: self.keychain.is_some(),
            keychain_backend: self.keychain.as_ref().map(|k| k.name()),
            encrypted_file: self.file.path().display().to_string(),
            encrypted_file_exists: self.file.exists(),
            storage_method,
            corrupted,
        }
    }
}

fn validate_key(key: &str) -> Result<&str, CredentialError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CredentialError::EmptyKey);
    }
    Ok(key)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
