// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "kamisync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sync project file snapshots with a kamiflow sync server")]
#[command(after_help = "\
Examples:
  kamisync init --url http://localhost:7890   Set up sync for this directory
  kamisync auth set <key>                     Store the API key securely
  kamisync push                               Upload changed files
  kamisync pull                               Download files changed remotely")]
pub struct Cli {
    /// Run as if kamisync was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize sync in the current directory
    Init {
        /// Sync server URL (http:// or https://)
        #[arg(long)]
        url: Option<String>,
    },

    /// Manage the sync API key
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Check that the sync server is reachable
    Health,

    /// Upload new and changed files, and deletions since the last push
    Push {
        /// Directory to sync (defaults to the project root)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Download files changed on the server since the last pull
    Pull {
        /// Directory to write into (defaults to the project root)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Ignore the saved cursor and download everything
        #[arg(long)]
        full: bool,
    },

    /// Show remote and local sync state
    Status,

    /// Delete every file of this project on the server
    DeleteRemote {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Store an API key (reads stdin when KEY is omitted or '-')
    Set {
        #[arg(value_parser = non_empty_string)]
        key: Option<String>,
    },

    /// Replace the stored API key
    Update {
        #[arg(value_parser = non_empty_string)]
        key: Option<String>,
    },

    /// Remove the stored API key
    Delete,

    /// Show where the API key is resolved from (never prints the key)
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
