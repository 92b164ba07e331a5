//! OAuth client credentials for the Google provider.
//!
//! User-provided, stored at:
//!   ~/.config/taskcal/providers/google/app_config.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("taskcal")
        .join("providers")
        .join("google"))
}

pub fn load() -> Result<Credentials> {
    load_from(&base_dir()?.join("app_config.toml"))
}

fn load_from(path: &Path) -> Result<Credentials> {
    if !path.exists() {
        anyhow::bail!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse credentials from {}", path.display()))
}
