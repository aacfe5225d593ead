// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

fn test_key() -> [u8; 32] {
    derive_key("build-host", "tester")
}

fn file_in(temp: &TempDir) -> EncryptedFile {
    EncryptedFile::with_key(temp.path().join("sync/credentials.enc"), test_key())
}

#[test]
fn test_derive_key_is_deterministic() {
    assert_eq!(derive_key("h", "u"), derive_key("h", "u"));
    assert_ne!(derive_key("h", "u"), derive_key("h", "v"));
    assert_ne!(derive_key("h", "u"), derive_key("g", "u"));
}

#[parameterized(
    account_wins = { Some("alice"), Some("root"), None, "alice" },
    env_user = { None, Some("bob"), Some("other"), "bob" },
    env_username = { None, None, Some("carol"), "carol" },
    empty_skipped = { Some(""), Some(""), Some("dave"), "dave" },
    nothing = { None, None, None, "unknown" },
)]
fn test_resolve_username(
    os: Option<&str>,
    user: Option<&str>,
    username: Option<&str>,
    expected: &str,
) {
    let own = |v: Option<&str>| v.map(str::to_string);
    assert_eq!(resolve_username(own(os), own(user), own(username)), expected);
}

#[test]
fn test_derive_key_matches_sha256_of_joined_input() {
    let expected = Sha256::digest(b"host:user:kamiflow-sync-credential-v1");
    assert_eq!(derive_key("host", "user").as_slice(), expected.as_slice());
}

#[test]
fn test_encrypt_decrypt_round_trip() {
    let envelope = encrypt(&test_key(), "sk-live-123").unwrap();
    assert_eq!(envelope.version, 1);
    assert_eq!(envelope.iv.len(), 32);
    assert_eq!(decrypt(&test_key(), &envelope).unwrap(), "sk-live-123");
}

#[test]
fn test_fresh_iv_per_write() {
    let a = encrypt(&test_key(), "same").unwrap();
    let b = encrypt(&test_key(), "same").unwrap();
    assert_ne!(a.iv, b.iv);
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn test_ciphertext_is_padded_to_block_size() {
    // 16 bytes of plaintext gain a full padding block
    let envelope = encrypt(&test_key(), "0123456789abcdef").unwrap();
    assert_eq!(hex::decode(&envelope.ciphertext).unwrap().len(), 32);
}

#[test]
fn test_file_write_read() {
    let temp = TempDir::new().unwrap();
    let file = file_in(&temp);
    assert!(!file.exists());
    assert_eq!(file.read().unwrap(), None);

    file.write("secret-value").unwrap();
    assert!(file.exists());
    assert_eq!(file.read().unwrap(), Some("secret-value".to_string()));

    let raw = std::fs::read_to_string(file.path()).unwrap();
    assert!(!raw.contains("secret-value"));
    let envelope: Envelope = serde_json::from_str(&raw).unwrap();
    assert_eq!(envelope.version, 1);
}

#[cfg(unix)]
#[test]
fn test_file_mode_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;
    let temp = TempDir::new().unwrap();
    let file = file_in(&temp);
    file.write("secret").unwrap();
    let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_wrong_key_is_corrupted() {
    let temp = TempDir::new().unwrap();
    file_in(&temp).write("secret").unwrap();

    let other = EncryptedFile::with_key(
        temp.path().join("sync/credentials.enc"),
        derive_key("other-host", "tester"),
    );
    // Wrong-key CBC decryption almost always fails the padding check; when
    // it happens to pass, the output is garbage rather than the secret.
    match other.read() {
        Err(StoreError::Corrupted(_)) => {}
        Ok(Some(s)) => assert_ne!(s, "secret"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[parameterized(
    not_json = { "this is not json" },
    missing_fields = { r#"{"version":1}"# },
    non_hex_iv = { r#"{"version":1,"iv":"zz","ciphertext":"00"}"# },
    short_iv = { r#"{"version":1,"iv":"0011","ciphertext":"00112233445566778899aabbccddeeff"}"# },
    partial_block = { r#"{"version":1,"iv":"00112233445566778899aabbccddeeff","ciphertext":"0011"}"# },
    empty_ciphertext = { r#"{"version":1,"iv":"00112233445566778899aabbccddeeff","ciphertext":""}"# },
    future_version = { r#"{"version":2,"iv":"00112233445566778899aabbccddeeff","ciphertext":"00"}"# },
)]
fn test_corrupted_file(content: &str) {
    let temp = TempDir::new().unwrap();
    let file = file_in(&temp);
    std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    std::fs::write(file.path(), content).unwrap();

    assert!(matches!(file.read(), Err(StoreError::Corrupted(_))));
}

#[test]
fn test_remove() {
    let temp = TempDir::new().unwrap();
    let file = file_in(&temp);
    assert!(!file.remove().unwrap());
    file.write("secret").unwrap();
    assert!(file.remove().unwrap());
    assert!(!file.exists());
}

#[test]
fn test_secret_store_impl_ignores_account() {
    let temp = TempDir::new().unwrap();
    let file = file_in(&temp);
    file.set("svc", "a", "one").unwrap();
    assert_eq!(file.get("svc", "b").unwrap(), Some("one".to_string()));
    assert!(file.delete("svc", "c").unwrap());
    assert_eq!(file.name(), "encrypted-file");
}

#[test]
fn test_debug_hides_key() {
    let temp = TempDir::new().unwrap();
    let rendered = format!("{:?}", file_in(&temp));
    assert!(rendered.contains("credentials.enc"));
    assert!(!rendered.contains("key"));
}
