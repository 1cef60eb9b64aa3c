//! Application configuration management.
//!
//! This module handles loading and saving the shell configuration: where the
//! built shell document lives, which extra assets to precache, and whether
//! the offline cache worker is enabled.
//!
//! Configuration is stored at `~/.config/clockshell/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data/cache directory paths
const APP_NAME: &str = "clockshell";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default location of the built shell document, relative to the working
/// directory.
const DEFAULT_SHELL_DOCUMENT: &str = "public/index.html";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// On-disk build output served as the navigation fallback document.
    pub shell_document: Option<PathBuf>,
    /// Extra URLs to precache at worker install time.
    #[serde(default)]
    pub precache: Vec<String>,
    /// Set to false to skip cache worker registration entirely.
    pub offline_enabled: Option<bool>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted flag.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Directory holding cached worker responses.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir =
            dirs::cache_dir().ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn shell_document_path(&self) -> PathBuf {
        self.shell_document
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SHELL_DOCUMENT))
    }

    pub fn is_offline_enabled(&self) -> bool {
        self.offline_enabled.unwrap_or(true)
    }
}

// ============================================================================
// Tests
// ============================================================================
