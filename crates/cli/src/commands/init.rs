// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::config::{init_work_dir, Config};
use crate::error::Result;

pub fn run(start: &Path, url: Option<String>) -> Result<()> {
    let work_dir = init_work_dir(start, url.as_deref())?;
    let config = Config::load(&work_dir)?;

    println!("Initialized kamisync at {}", work_dir.display());
    println!("Project: {}", config.project_id);
    match &config.remote {
        Some(remote) => println!("Remote: {}", remote.url),
        None => {
            println!();
            println!("No remote configured. Add one to .kamiflow/config.toml:");
            println!();
            println!("  [remote]");
            println!("  url = \"http://your-server:7890\"");
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
