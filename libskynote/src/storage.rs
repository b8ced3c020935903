//! Local (non-synced) key/value storage
//!
//! This is where the app password lives. Unlike the durable settings it is
//! never synced, and it is read and written synchronously.
//!
//! Backends:
//! - `FileLocalStorage`: JSON object in the local data directory (default)
//! - `KeyringLocalStorage`: OS-native keyring
//! - `MemoryLocalStorage`: process-local map for tests and embedding

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::config::{LocalStorageConfig, StorageBackend};
use crate::error::{Result, StorageError};

/// Key the app password is stored under
pub const APP_PASSWORD_KEY: &str = "appPassword";

/// Synchronous key/value storage provided by the host
pub trait LocalStorage: Send + Sync {
    /// Read a value; `None` when the key has never been set or was cleared
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a value and return what is now stored.
    ///
    /// `None` clears the key.
    fn save(&self, key: &str, value: Option<&str>) -> Result<Option<String>>;

    /// Name used in log output
    fn backend_name(&self) -> &str;
}

/// Open the backend selected in the configuration
pub fn open_local_storage(
    config: &LocalStorageConfig,
    path: PathBuf,
) -> Result<Box<dyn LocalStorage>> {
    match config.backend {
        StorageBackend::File => Ok(Box::new(FileLocalStorage::new(path))),
        StorageBackend::Keyring => Ok(Box::new(KeyringLocalStorage::new("skynote")?)),
    }
}

/// Local storage backed by a single JSON file
pub struct FileLocalStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content).map_err(StorageError::Format)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::Io(e).into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let content = serde_json::to_string_pretty(map).map_err(StorageError::Format)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        // Owner-only from the first byte: new files are created 0600, and an
        // existing file is narrowed before its contents are replaced
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(0o600);
            if self.path.exists() {
                let perms = std::fs::Permissions::from_mode(0o600);
                std::fs::set_permissions(&self.path, perms).map_err(StorageError::Io)?;
            }
        }

        let mut file = options.open(&self.path).map_err(StorageError::Io)?;
        file.write_all(content.as_bytes()).map_err(StorageError::Io)?;
        file.flush().map_err(StorageError::Io)?;

        Ok(())
    }
}

impl LocalStorage for FileLocalStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_map()?.remove(key))
    }

    fn save(&self, key: &str, value: Option<&str>) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;

        match value {
            Some(value) => {
                map.insert(key.to_string(), value.to_string());
            }
            None => {
                map.remove(key);
            }
        }
        self.write_map(&map)?;

        tracing::debug!("Updated {} in local storage at {:?}", key, self.path);
        Ok(value.map(str::to_string))
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

/// OS-native keyring storage
///
/// - **macOS**: Keychain
/// - **Windows**: Credential Manager
/// - **Linux**: Secret Service via D-Bus
///
/// May be unavailable on headless systems, in which case construction fails
/// with `StorageError::KeyringUnavailable`.
pub struct KeyringLocalStorage {
    service: String,
}

impl KeyringLocalStorage {
    pub fn new(service: &str) -> Result<Self> {
        // Probe availability before handing out the store
        keyring::Entry::new(service, "availability_check").map_err(|e| {
            StorageError::KeyringUnavailable(format!("OS keyring not accessible: {}", e))
        })?;

        Ok(Self {
            service: service.to_string(),
        })
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, key)
            .map_err(|e| StorageError::KeyringUnavailable(e.to_string()))?)
    }
}

impl LocalStorage for KeyringLocalStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Keyring(e.to_string()).into()),
        }
    }

    fn save(&self, key: &str, value: Option<&str>) -> Result<Option<String>> {
        let entry = self.entry(key)?;

        match value {
            Some(value) => entry
                .set_password(value)
                .map_err(|e| StorageError::Keyring(e.to_string()))?,
            None => match entry.delete_password() {
                // Clearing a key that was never set is fine
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(StorageError::Keyring(e.to_string()).into()),
            },
        }

        tracing::debug!("Updated {}.{} in OS keyring", self.service, key);
        Ok(value.map(str::to_string))
    }

    fn backend_name(&self) -> &str {
        "keyring"
    }
}

/// Process-local storage
#[derive(Default)]
pub struct MemoryLocalStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with an app password
    pub fn with_app_password(password: &str) -> Self {
        let storage = Self::new();
        storage
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(APP_PASSWORD_KEY.to_string(), password.to_string());
        storage
    }
}

impl LocalStorage for MemoryLocalStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: Option<&str>) -> Result<Option<String>> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(value) => {
                values.insert(key.to_string(), value.to_string());
            }
            None => {
                values.remove(key);
            }
        }
        Ok(value.map(str::to_string))
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
