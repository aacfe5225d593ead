// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Encrypted credential file, the last storage tier.
//!
//! The secret is encrypted with AES-256-CBC (PKCS#7 padding) under a key
//! derived from the machine's hostname and the current user, with a fresh
//! random IV on every write. The file is a small JSON envelope:
//!
//! ```json
//! {"version":1,"iv":"<32 hex chars>","ciphertext":"<hex>"}
//! ```
//!
//! The key binds the file to one user on one machine. It keeps the secret
//! out of plain sight in the project tree; it does not protect against an
//! attacker who can run code as that user.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::keychain::{SecretStore, StoreError};
use crate::id::random_bytes;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Fixed salt mixed into the key derivation.
pub const SALT: &str = "kamiflow-sync-credential-v1";

const FORMAT_VERSION: u32 = 1;
const IV_LEN: usize = 16;

/// On-disk JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u32,
    /// Hex-encoded 16-byte IV.
    pub iv: String,
    /// Hex-encoded ciphertext.
    pub ciphertext: String,
}

/// Derive the 256-bit file key as `SHA-256(hostname:username:SALT)`.
pub fn derive_key(hostname: &str, username: &str) -> [u8; 32] {
    let digest = Sha256::digest(format!("{hostname}:{username}:{SALT}").as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

/// The key for the current machine and user.
pub fn machine_key() -> [u8; 32] {
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    derive_key(&hostname, &current_username())
}

fn current_username() -> String {
    resolve_username(
        os_username(),
        std::env::var("USER").ok(),
        std::env::var("USERNAME").ok(),
    )
}

/// Picks the first non-empty name: the account of the running uid, then
/// `$USER`, then `$USERNAME`.
///
/// The account name wins so the key stays the same under cron or in
/// containers that do not set `$USER`.
fn resolve_username(
    os: Option<String>,
    user_env: Option<String>,
    username_env: Option<String>,
) -> String {
    if let Some(name) = [os, user_env, username_env]
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty())
    {
        return name;
    }
    tracing::debug!("no user name available, credential key uses \"unknown\"");
    "unknown".to_string()
}

#[cfg(unix)]
fn os_username() -> Option<String> {
    use nix::unistd::{Uid, User};

    match User::from_uid(Uid::current()) {
        Ok(user) => user.map(|u| u.name),
        Err(e) => {
            tracing::debug!(error = %e, "passwd lookup failed");
            None
        }
    }
}

#[cfg(not(unix))]
fn os_username() -> Option<String> {
    None
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
pub fn encrypt(key: &[u8; 32], plaintext: &str) -> std::io::Result<Envelope> {
    let iv = random_bytes::<IV_LEN>()?;
    let cipher = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    Ok(Envelope {
        version: FORMAT_VERSION,
        iv: hex::encode(iv),
        ciphertext: hex::encode(ciphertext),
    })
}

/// Decrypt an envelope. Any failure is reported as a reason string.
pub fn decrypt(key: &[u8; 32], envelope: &Envelope) -> Result<String, String> {
    if envelope.version != FORMAT_VERSION {
        return Err(format!("unsupported version {}", envelope.version));
    }
    let iv = hex::decode(&envelope.iv).map_err(|e| format!("invalid iv: {e}"))?;
    if iv.len() != IV_LEN {
        return Err(format!("iv must be {IV_LEN} bytes, got {}", iv.len()));
    }
    let ciphertext =
        hex::decode(&envelope.ciphertext).map_err(|e| format!("invalid ciphertext: {e}"))?;
    let cipher = Aes256CbcDec::new_from_slices(key, &iv).map_err(|e| e.to_string())?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| "decryption failed (wrong key or damaged file)".to_string())?;
    String::from_utf8(plaintext).map_err(|_| "decrypted secret is not UTF-8".to_string())
}

/// The encrypted credential file of one project.
pub struct EncryptedFile {
    path: PathBuf,
    key: [u8; 32],
}

impl std::fmt::Debug for EncryptedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFile")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EncryptedFile {
    /// A file at `path` keyed to this machine and user.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, machine_key())
    }

    pub fn with_key(path: impl Into<PathBuf>, key: [u8; 32]) -> Self {
        EncryptedFile {
            path: path.into(),
            key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and decrypts the secret.
    ///
    /// Returns `Ok(None)` when the file does not exist and
    /// [`StoreError::Corrupted`] when it exists but cannot be decrypted.
    pub fn read(&self) -> Result<Option<String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let envelope: Envelope = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupted(format!("invalid envelope: {e}")))?;
        decrypt(&self.key, &envelope)
            .map(Some)
            .map_err(StoreError::Corrupted)
    }

    /// Encrypts and writes the secret, readable only by the owner on unix.
    pub fn write(&self, secret: &str) -> std::io::Result<()> {
        let envelope = encrypt(&self.key, secret)?;
        let json = serde_json::to_vec(&envelope)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = open_private(&self.path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        Ok(())
    }

    /// Removes the file. Returns `true` if it existed.
    pub fn remove(&self) -> std::io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// The file holds the single secret of its project, so `service` and
/// `account` are ignored.
impl SecretStore for EncryptedFile {
    fn name(&self) -> &'static str {
        "encrypted-file"
    }

    fn get(&self, _service: &str, _account: &str) -> Result<Option<String>, StoreError> {
        self.read()
    }

    fn set(&self, _service: &str, _account: &str, secret: &str) -> Result<(), StoreError> {
        Ok(self.write(secret)?)
    }

    fn delete(&self, _service: &str, _account: &str) -> Result<bool, StoreError> {
        Ok(self.remove()?)
    }
}

#[cfg(test)]
#[path = "encrypted_tests.rs"]
mod tests;
