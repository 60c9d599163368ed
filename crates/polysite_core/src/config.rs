//! Site configuration.
//!
//! Persisted as TOML, typically at `~/.config/polysite/config.toml` on
//! Unix systems. Holds the bucket pair and the storage endpoint the CLI
//! connects to; credentials come from the environment, never from this
//! file.

use serde::{Deserialize, Serialize};
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use crate::error::Result;

/// The parts of a site deployment the user configures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Bucket serving the rendered website
    pub website_bucket: String,

    /// Bucket holding the editable state and backups
    pub backup_bucket: String,

    /// Storage region
    pub region: String,

    /// Custom storage endpoint URL, for S3-compatible providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Site title, used to name exported archives
    #[serde(default = "default_site_title")]
    pub site_title: String,
}

fn default_site_title() -> String {
    "site".to_string()
}

impl SiteConfig {
    /// Create a config for a bucket pair with defaults elsewhere.
    pub fn new(website_bucket: impl Into<String>, backup_bucket: impl Into<String>) -> Self {
        Self {
            website_bucket: website_bucket.into(),
            backup_bucket: backup_bucket.into(),
            region: "us-east-1".to_string(),
            endpoint: None,
            site_title: default_site_title(),
        }
    }

    /// Parse a config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize the config as TOML text.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SiteConfig {
    /// Get the config file path (~/.config/polysite/config.toml).
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("polysite").join("config.toml"))
    }

    /// Load config from the default location.
    ///
    /// Returns `Ok(None)` when no config file exists yet.
    pub fn load() -> Result<Option<Self>> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)?;
                Ok(Some(Self::from_toml(&contents)?))
            }
            _ => Ok(None),
        }
    }

    /// Save config to the default location, creating the directory if
    /// needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(crate::error::SiteError::NoConfigDir)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.to_toml()?)?;
        Ok(())
    }
}
