//! Durable settings persistence
//!
//! The host keeps plugin settings in a synced, durable location. Loading
//! merges whatever is stored with [`Config::default`]; saving writes the
//! whole document back. Both go through [`Config::to_toml`] /
//! [`Config::from_toml`], so the legacy password slot can never round-trip.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Asynchronous load/save pair for the durable configuration
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the configuration, falling back to defaults when nothing is stored
    async fn load(&self) -> Result<Config>;

    /// Persist the configuration; returns once the write has completed
    async fn save(&self, config: &Config) -> Result<()>;
}

/// Settings kept in a TOML file on disk
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for TomlSettingsStore {
    async fn load(&self) -> Result<Config> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Config::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings at {}, using defaults", self.path.display());
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::ReadError(e).into()),
        }
    }

    async fn save(&self, config: &Config) -> Result<()> {
        let content = config.to_toml()?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ConfigError::WriteError)?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(ConfigError::WriteError)?;

        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

/// In-process settings, serialized the same way as the file store
#[derive(Default)]
pub struct MemorySettingsStore {
    document: Mutex<Option<String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved TOML document, if any
    pub fn document(&self) -> Option<String> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Config> {
        match self.document() {
            Some(content) => Config::from_toml(&content),
            None => Ok(Config::default()),
        }
    }

    async fn save(&self, config: &Config) -> Result<()> {
        let content = config.to_toml()?;
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(content);
        Ok(())
    }
}
