//! Configuration management for Skynote
//!
//! The durable configuration carries the account identifier and where the
//! host keeps its local storage and vault. The app password is never part
//! of it: the `app_password` slot only exists so old settings files still
//! parse, and whatever it holds is dropped on load and never written back.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Placeholder identifier shown before the user enters their handle
pub const DEFAULT_IDENTIFIER: &str = ".bsky.social";

/// Service endpoint the session is bound to
pub const DEFAULT_SERVICE: &str = "https://bsky.social";

/// Number of timeline entries fetched per page
pub const DEFAULT_TIMELINE_LIMIT: u16 = 10;

/// Page sizes getTimeline accepts
pub const TIMELINE_LIMIT_RANGE: RangeInclusive<u16> = 1..=100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Handle or domain used to authenticate (e.g. "alice.bsky.social")
    pub identifier: String,

    /// Legacy slot, never populated with a real secret
    #[serde(rename = "appPassword", skip_serializing)]
    pub app_password: String,

    pub service: String,
    pub timeline_limit: u16,
    pub vault: VaultConfig,
    pub storage: LocalStorageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory notes are created in (current directory when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Where the ephemeral app password lives
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file in the local (non-synced) data directory
    #[default]
    File,
    /// OS-native keyring
    Keyring,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocalStorageConfig {
    pub backend: StorageBackend,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_IDENTIFIER.to_string(),
            app_password: String::new(),
            service: DEFAULT_SERVICE.to_string(),
            timeline_limit: DEFAULT_TIMELINE_LIMIT,
            vault: VaultConfig::default(),
            storage: LocalStorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a specific path, merging with defaults.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::ReadError(e).into()),
        };
        Self::from_toml(&content)
    }

    /// Parse a TOML document, dropping any legacy password value
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` when `timeline_limit` is outside 1..=100.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config.without_legacy_password())
    }

    fn validate(&self) -> Result<()> {
        if !TIMELINE_LIMIT_RANGE.contains(&self.timeline_limit) {
            return Err(ConfigError::InvalidValue {
                field: "timeline_limit".to_string(),
                reason: format!(
                    "{} is outside {}..={}",
                    self.timeline_limit,
                    TIMELINE_LIMIT_RANGE.start(),
                    TIMELINE_LIMIT_RANGE.end()
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Serialize to TOML; the legacy password slot is never emitted
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?)
    }

    fn without_legacy_password(mut self) -> Self {
        if !self.app_password.is_empty() {
            tracing::warn!(
                "Ignoring app password found in settings file; use the settings app-password command instead"
            );
            self.app_password.clear();
        }
        self
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SKYNOTE_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("skynote").join("config.toml"))
}

/// Resolve the local storage file path.
///
/// `SKYNOTE_LOCAL_STORAGE` wins over `storage.path`; otherwise the file
/// lives in the platform's local (non-roaming) data directory.
pub fn resolve_local_storage_path(config: &Config) -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SKYNOTE_LOCAL_STORAGE") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    if let Some(path) = &config.storage.path {
        return Ok(PathBuf::from(shellexpand::tilde(path).to_string()));
    }

    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| ConfigError::MissingField("local data directory".to_string()))?;

    Ok(data_dir.join("skynote").join("local-storage.json"))
}

/// Resolve the vault directory notes are written to
pub fn resolve_vault_path(config: &Config) -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SKYNOTE_VAULT") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    match &config.vault.path {
        Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).to_string())),
        None => std::env::current_dir()
            .map_err(|e| ConfigError::ReadError(e).into()),
    }
}
