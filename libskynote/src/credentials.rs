//! Credential store for the Bluesky account
//!
//! A credential is split across two places:
//! - the **identifier** lives in the durable settings ([`SettingsStore`])
//! - the **app password** lives only in local storage ([`LocalStorage`])
//!
//! The store keeps an in-memory copy of both. The password is wrapped in a
//! [`SecretString`] so it is zeroed on drop and redacted from `Debug` output.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use libskynote::credentials::CredentialStore;
//! use libskynote::settings::MemorySettingsStore;
//! use libskynote::storage::MemoryLocalStorage;
//!
//! # async fn example() -> libskynote::Result<()> {
//! let store = CredentialStore::open(
//!     Arc::new(MemorySettingsStore::new()),
//!     Arc::new(MemoryLocalStorage::new()),
//! )
//! .await?;
//!
//! store.save("alice.bsky.social").await?;
//! store.set_app_password("abcd-efgh-ijkl-mnop")?;
//! assert!(store.credential().is_complete());
//! # Ok(())
//! # }
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::settings::SettingsStore;
use crate::storage::{LocalStorage, APP_PASSWORD_KEY};

/// Identifier plus the ephemeral app password
#[derive(Debug)]
pub struct Credential {
    pub identifier: String,
    password: Option<SecretString>,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, password: Option<&str>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.map(|p| SecretString::from(p.to_string())),
        }
    }

    /// The app password, if one is stored
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.expose_secret())
    }

    /// Both halves present and non-empty
    pub fn is_complete(&self) -> bool {
        !self.identifier.is_empty() && self.password().is_some_and(|p| !p.is_empty())
    }
}

pub struct CredentialStore {
    settings: Arc<dyn SettingsStore>,
    storage: Arc<dyn LocalStorage>,
    current: RwLock<Credential>,
}

impl CredentialStore {
    /// Build a store and load the current credential
    pub async fn open(
        settings: Arc<dyn SettingsStore>,
        storage: Arc<dyn LocalStorage>,
    ) -> Result<Self> {
        let store = Self {
            settings,
            storage,
            current: RwLock::new(Credential::new(String::new(), None)),
        };
        store.load().await?;
        Ok(store)
    }

    /// Read the identifier from settings and the password from local storage.
    ///
    /// Settings are only read here, never written back.
    pub async fn load(&self) -> Result<Credential> {
        let config = self.settings.load().await?;
        let password = self.storage.load(APP_PASSWORD_KEY)?;

        tracing::debug!(
            "Loaded credential for '{}' (password {}, backend {})",
            config.identifier,
            if password.is_some() { "present" } else { "absent" },
            self.storage.backend_name()
        );

        *self.current.write().unwrap_or_else(PoisonError::into_inner) =
            Credential::new(config.identifier.clone(), password.as_deref());
        Ok(Credential::new(config.identifier, password.as_deref()))
    }

    /// Overwrite the stored app password with `value`; `None` clears it.
    ///
    /// Returns what local storage now holds. The in-memory copy is left
    /// alone; see [`CredentialStore::replace_password`].
    pub fn initialize_password(&self, value: Option<&str>) -> Result<Option<SecretString>> {
        let stored = self.storage.save(APP_PASSWORD_KEY, value)?;
        tracing::info!(
            "App password {} in {} storage",
            if stored.is_some() { "updated" } else { "cleared" },
            self.storage.backend_name()
        );
        Ok(stored.map(SecretString::from))
    }

    /// Replace the in-memory password
    pub fn replace_password(&self, password: Option<SecretString>) {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .password = password;
    }

    /// Write a new password straight to local storage and use it from now on
    pub fn set_app_password(&self, value: &str) -> Result<()> {
        let stored = self.initialize_password(Some(value))?;
        self.replace_password(stored);
        Ok(())
    }

    /// Persist the identifier; returns after the settings write completes.
    ///
    /// Only the identifier field changes. The password is never written to
    /// the durable settings.
    pub async fn save(&self, identifier: &str) -> Result<()> {
        let mut config = self.settings.load().await?;
        config.identifier = identifier.to_string();
        self.settings.save(&config).await?;

        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .identifier = identifier.to_string();
        tracing::info!("Saved identifier '{}'", identifier);
        Ok(())
    }

    /// Snapshot of the in-memory credential
    pub fn credential(&self) -> Credential {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Credential::new(current.identifier.clone(), current.password())
    }
}
