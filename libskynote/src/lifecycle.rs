//! Plugin lifecycle and shared context
//!
//! The host calls [`Core::initialize`] when the plugin loads and
//! [`Core::shutdown`] when it unloads. A host that loads the plugin only to
//! run a login or a local settings change uses [`Core::initialize_with`]
//! and skips the automatic login, so a single command never contacts the
//! service twice. In between, every command goes
//! through the [`CommandDispatcher`], which receives the [`PluginContext`]
//! explicitly instead of reaching into host-managed state.
//!
//! # Example
//!
//! ```no_run
//! use libskynote::config::resolve_config_path;
//! use libskynote::lifecycle::{Core, CoreParts};
//!
//! # async fn example() -> libskynote::Result<()> {
//! let parts = CoreParts::from_config_path(resolve_config_path()?)?;
//! let core = Core::initialize(parts).await?;
//!
//! core.dispatcher().post_selection(Some("Hello from my notes")).await;
//!
//! core.shutdown();
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{resolve_local_storage_path, resolve_vault_path, Config};
use crate::credentials::CredentialStore;
use crate::dispatcher::CommandDispatcher;
use crate::error::{Result, SessionError};
use crate::notes::{NoteSink, VaultDir};
use crate::notify::{Notice, Notifier, StderrNotifier};
use crate::remote::{BlueskySession, RemoteSession};
use crate::session::SessionClient;
use crate::settings::{SettingsStore, TomlSettingsStore};
use crate::storage::{open_local_storage, LocalStorage};

/// Everything a command handler may touch
pub struct PluginContext {
    pub credentials: CredentialStore,
    pub session: SessionClient,
    pub notifier: Arc<dyn Notifier>,
    pub notes: Arc<dyn NoteSink>,
    pub timeline_limit: u16,
}

/// Collaborators the host provides
pub struct CoreParts {
    pub settings: Arc<dyn SettingsStore>,
    pub storage: Arc<dyn LocalStorage>,
    pub remote: Arc<dyn RemoteSession>,
    pub notifier: Arc<dyn Notifier>,
    pub notes: Arc<dyn NoteSink>,
}

impl CoreParts {
    /// Wire up the on-disk collaborators described by the settings file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be parsed, the local
    /// storage backend is unavailable, or the HTTP client cannot be built.
    pub fn from_config_path(path: PathBuf) -> Result<Self> {
        let config = Config::load_from_path(&path)?;

        let storage_path = resolve_local_storage_path(&config)?;
        let storage = open_local_storage(&config.storage, storage_path)?;
        let vault = VaultDir::new(resolve_vault_path(&config)?);
        let remote = BlueskySession::new(&config.service).map_err(SessionError::from)?;

        tracing::debug!(
            "Using settings {}, {} local storage, vault {}",
            path.display(),
            storage.backend_name(),
            vault.root().display()
        );

        Ok(Self {
            settings: Arc::new(TomlSettingsStore::new(path)),
            storage: Arc::from(storage),
            remote: Arc::new(remote),
            notifier: Arc::new(StderrNotifier),
            notes: Arc::new(vault),
        })
    }
}

/// A loaded plugin instance
pub struct Core {
    context: Arc<PluginContext>,
}

impl Core {
    /// Load settings and credentials, then log in if both halves are present
    ///
    /// A failed automatic login is reported like any other login and does
    /// not fail initialization.
    pub async fn initialize(parts: CoreParts) -> Result<Self> {
        Self::initialize_with(parts, true).await
    }

    /// As [`Core::initialize`]; the automatic login runs only when `auto_login` is set
    pub async fn initialize_with(parts: CoreParts, auto_login: bool) -> Result<Self> {
        let config = parts.settings.load().await?;
        let credentials = CredentialStore::open(parts.settings, parts.storage).await?;

        let context = Arc::new(PluginContext {
            credentials,
            session: SessionClient::new(parts.remote),
            notifier: parts.notifier,
            notes: parts.notes,
            timeline_limit: config.timeline_limit,
        });
        let core = Self { context };

        if auto_login && core.context.credentials.credential().is_complete() {
            tracing::info!("Stored credential found, logging in");
            core.dispatcher().login().await;
        }

        Ok(core)
    }

    pub fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(Arc::clone(&self.context))
    }

    pub fn settings(&self) -> SettingsPanel {
        SettingsPanel {
            context: Arc::clone(&self.context),
        }
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    /// Unload the plugin; the session is dropped without a remote call
    pub fn shutdown(self) {
        tracing::debug!(
            "Shutting down (authenticated: {})",
            self.context.session.is_authenticated()
        );
    }
}

/// The two settings fields: identifier and write-only app password
pub struct SettingsPanel {
    context: Arc<PluginContext>,
}

impl SettingsPanel {
    /// Current identifier, as shown in the identifier field
    pub fn identifier(&self) -> String {
        self.context.credentials.credential().identifier
    }

    /// Whether an app password is stored; the value itself is never shown
    pub fn has_app_password(&self) -> bool {
        self.context
            .credentials
            .credential()
            .password()
            .is_some_and(|p| !p.is_empty())
    }

    /// Persist a new identifier
    pub async fn set_identifier(&self, identifier: &str) -> Notice {
        let notice = match self.context.credentials.save(identifier).await {
            Ok(()) => Notice::IdentifierSaved,
            Err(e) => {
                tracing::error!("Failed to save identifier: {}", e);
                Notice::SettingsFailed
            }
        };
        self.context.notifier.notify(&notice.to_string());
        notice
    }

    /// Write a new app password straight to local storage
    pub fn set_app_password(&self, value: &str) -> Notice {
        let notice = match self.context.credentials.set_app_password(value) {
            Ok(()) => Notice::AppPasswordSaved,
            Err(e) => {
                tracing::error!("Failed to store app password: {}", e);
                Notice::SettingsFailed
            }
        };
        self.context.notifier.notify(&notice.to_string());
        notice
    }
}
