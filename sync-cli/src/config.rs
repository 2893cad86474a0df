//! Configuration loading for playsync-cli.

use anyhow::{Context, Result};
use playsync_client::SyncConfig;
use std::path::Path;

/// Load the sync configuration, falling back to defaults when no file is given.
pub fn load(path: Option<&Path>) -> Result<SyncConfig> {
    match path {
        Some(path) => SyncConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(SyncConfig::default()),
    }
}
