// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.kamiflow/config.toml` and includes:
//! - `project_id`: The random ID that scopes this project's credentials and remote files
//! - `[remote]`: The sync backend URL plus timeout and retry tuning

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::id::{generate_project_id, is_generated_project_id};
use crate::sync::RetryPolicy;

const WORK_DIR_NAME: &str = ".kamiflow";
const CONFIG_FILE_NAME: &str = "config.toml";
const SYNC_DIR_NAME: &str = "sync";
const CREDENTIALS_FILE_NAME: &str = "credentials.enc";
const STATE_FILE_NAME: &str = "state.json";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Project configuration stored in `.kamiflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Project ID (32 lowercase hex chars). Empty until first needed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    /// Sync backend (optional until the first push or pull).
    pub remote: Option<RemoteConfig>,
}

/// Sync backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the sync server, `http://` or `https://`.
    pub url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per request including the first (default: 3). 1 disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds (default: 100).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound on the backoff delay in milliseconds (default: 5000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl RemoteConfig {
    /// Creates a remote config with default tuning.
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }

    /// Validates that the URL is in a recognized format.
    ///
    /// Returns an error message if the URL is invalid.
    pub fn validate_url(&self) -> Option<String> {
        let rest = self
            .url
            .strip_prefix("http://")
            .or_else(|| self.url.strip_prefix("https://"));
        match rest {
            Some(host) if !host.trim_matches('/').is_empty() => None,
            Some(_) => Some(format!("remote URL '{}' has no host", self.url)),
            None => Some(format!(
                "invalid remote URL '{}': must start with http:// or https://",
                self.url
            )),
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy described by this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            ..RetryPolicy::default()
        }
    }
}

impl Config {
    /// Creates a config with a freshly generated project ID.
    pub fn new() -> Result<Self> {
        Ok(Config {
            project_id: generate_project_id()?,
            remote: None,
        })
    }

    /// Loads configuration from the given `.kamiflow/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Saves configuration to the given `.kamiflow/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Returns the project ID, generating and persisting one if absent.
    ///
    /// An existing ID is never replaced.
    pub fn ensure_project_id(&mut self, work_dir: &Path) -> Result<String> {
        if self.project_id.trim().is_empty() {
            self.project_id = generate_project_id()?;
            self.save(work_dir)?;
            tracing::info!(project_id = %self.project_id, "generated project id");
        } else if !is_generated_project_id(&self.project_id) {
            tracing::warn!(
                project_id = %self.project_id,
                "project id was not generated by kamisync"
            );
        }
        Ok(self.project_id.clone())
    }

    /// Resolves the effective remote, letting `KAMIFLOW_SYNC_URL` override
    /// the configured URL.
    pub fn effective_remote(&self) -> Result<RemoteConfig> {
        self.remote_with_override(env::sync_url())
    }

    fn remote_with_override(&self, url_override: Option<String>) -> Result<RemoteConfig> {
        let remote = match (url_override, &self.remote) {
            (Some(url), Some(remote)) => RemoteConfig {
                url,
                ..remote.clone()
            },
            (Some(url), None) => RemoteConfig::new(url),
            (None, Some(remote)) => remote.clone(),
            (None, None) => return Err(Error::NoRemote),
        };
        if let Some(msg) = remote.validate_url() {
            return Err(Error::Config(msg));
        }
        Ok(remote)
    }
}

/// Find the .kamiflow directory by walking up from the current directory
pub fn find_work_dir() -> Result<PathBuf> {
    find_work_dir_from(&std::env::current_dir()?)
}

/// Find the .kamiflow directory by walking up from `start`
pub fn find_work_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.join(CONFIG_FILE_NAME).is_file() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// The project root containing the `.kamiflow/` directory.
pub fn project_root(work_dir: &Path) -> PathBuf {
    work_dir.parent().unwrap_or(work_dir).to_path_buf()
}

/// Directory holding sync-private files (credentials, cursor state).
pub fn sync_dir(work_dir: &Path) -> PathBuf {
    work_dir.join(SYNC_DIR_NAME)
}

/// Path of the encrypted credential fallback file.
pub fn credentials_path(work_dir: &Path) -> PathBuf {
    sync_dir(work_dir).join(CREDENTIALS_FILE_NAME)
}

/// Path of the local sync state (cursor and pushed checksums).
pub fn state_path(work_dir: &Path) -> PathBuf {
    sync_dir(work_dir).join(STATE_FILE_NAME)
}

/// Initialize a new .kamiflow directory at the given path
pub fn init_work_dir(path: &Path, url: Option<&str>) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    let mut config = Config::new()?;
    if let Some(url) = url {
        let remote = RemoteConfig::new(url);
        if let Some(msg) = remote.validate_url() {
            return Err(Error::Config(msg));
        }
        config.remote = Some(remote);
    }

    fs::create_dir_all(sync_dir(&work_dir))?;
    config.save(&work_dir)?;
    write_gitignore(&work_dir)?;

    Ok(work_dir)
}

/// Write a .gitignore file to the work directory.
///
/// Credentials and cursor state are per machine and never committed.
pub fn write_gitignore(work_dir: &Path) -> Result<()> {
    let gitignore_path = work_dir.join(GITIGNORE_FILE_NAME);
    fs::write(
        &gitignore_path,
        "# Per-machine sync state and encrypted credentials\nsync/\n",
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
