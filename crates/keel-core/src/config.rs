//! Workspace configuration (`keel.toml`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "keel.toml";

/// Default store file name, placed next to the config.
pub const DEFAULT_STORE_FILE: &str = "keel.sqlite3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeelConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for KeelConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite store. Relative paths resolve against the
    /// config file's directory.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// When false, mutations skip the notification sink entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_FILE)
}

const fn default_true() -> bool {
    true
}

impl KeelConfig {
    /// Load config from `dir/keel.toml`, then the per-user global
    /// config, then defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when a config file exists but cannot be read or
    /// parsed.
    pub fn load(dir: &Path) -> Result<Self> {
        let workspace = dir.join(CONFIG_FILE_NAME);
        if workspace.exists() {
            return Self::read(&workspace);
        }
        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::read(&global);
            }
        }
        Ok(Self::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// `~/.config/keel/keel.toml` (platform equivalent).
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keel").join(CONFIG_FILE_NAME))
    }

    /// Write the config to `dir/keel.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE_NAME);
        let text = toml::to_string_pretty(self).context("serialize config")?;
        std::fs::write(&path, text).with_context(|| format!("write config {}", path.display()))
    }

    /// Absolute store path for a workspace rooted at `dir`.
    #[must_use]
    pub fn store_path(&self, dir: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            dir.join(&self.store.path)
        }
    }
}
