// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn test_error_not_initialized_display() {
    let err = Error::NotInitialized;
    assert!(err.to_string().contains("not initialized"));
    assert!(err.to_string().contains("kamisync init"));
}

#[test]
fn test_error_already_initialized_display() {
    let err = Error::AlreadyInitialized("/path/to/.kamiflow".to_string());
    assert!(err.to_string().contains("already initialized"));
    assert!(err.to_string().contains("/path/to/.kamiflow"));
}

#[test]
fn test_error_hints() {
    assert!(Error::NoRemote.to_string().contains("KAMIFLOW_SYNC_URL"));
    assert!(Error::NoCredentials
        .to_string()
        .contains("KAMIFLOW_SYNC_API_KEY"));
    let err = Error::ConfirmationRequired {
        action: "delete-remote",
    };
    assert!(err.to_string().contains("--yes"));
}

#[test]
fn test_error_from_credential() {
    let err: Error = CredentialError::EmptyKey.into();
    assert!(matches!(err, Error::Credential(CredentialError::EmptyKey)));
    assert!(err.to_string().contains("cannot be empty"));
}

#[test]
fn test_error_from_sync() {
    let err: Error = SyncError::Http {
        status: 503,
        message: "busy".to_string(),
        body: serde_json::json!({"error": "busy"}),
    }
    .into();
    let msg = err.to_string();
    assert!(msg.contains("503"));
    assert!(msg.contains("busy"));
}

#[test]
fn test_error_from_core_is_transparent() {
    let core = km_core::Error::InvalidPath("../x".to_string());
    let expected = core.to_string();
    let err: Error = core.into();
    assert_eq!(err.to_string(), expected);
}

#[test]
fn test_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: Error = io.into();
    assert!(err.to_string().contains("io error"));
}
