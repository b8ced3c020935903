//! Note creation in the host vault

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::io::AsyncWriteExt;

use crate::error::NoteError;

/// File name for a timeline note taken at `at` (local wall-clock time)
pub fn timeline_filename(at: NaiveDateTime) -> String {
    format!("timeline_{}.md", at.format("%Y-%m-%d-%H-%M-%S"))
}

/// Vault file-creation primitive
#[async_trait]
pub trait NoteSink: Send + Sync {
    /// Create a new note at `path` (relative to the vault) holding `content`.
    ///
    /// Returns the full path of the created note.
    ///
    /// # Errors
    ///
    /// `NoteError::AlreadyExists` when a note already exists at `path`.
    async fn create_file(&self, path: &str, content: &str) -> Result<PathBuf, NoteError>;
}

/// Vault rooted at a directory on disk
pub struct VaultDir {
    root: PathBuf,
}

impl VaultDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl NoteSink for VaultDir {
    async fn create_file(&self, path: &str, content: &str) -> Result<PathBuf, NoteError> {
        let full_path = self.root.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(NoteError::AlreadyExists(full_path));
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Created note {}", full_path.display());
        Ok(full_path)
    }
}

/// In-memory vault
#[derive(Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NoteSink for MemoryVault {
    async fn create_file(&self, path: &str, content: &str) -> Result<PathBuf, NoteError> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if files.contains_key(path) {
            return Err(NoteError::AlreadyExists(PathBuf::from(path)));
        }
        files.insert(path.to_string(), content.to_string());
        Ok(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_timeline_filename_is_zero_padded() {
        assert_eq!(timeline_filename(instant()), "timeline_2024-01-02-03-04-05.md");
    }

    #[test]
    fn test_timeline_filename_two_digit_fields() {
        let at = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap();
        assert_eq!(timeline_filename(at), "timeline_2023-12-31-23-59-58.md");
    }

    #[tokio::test]
    async fn test_vault_dir_creates_note() {
        let temp_dir = TempDir::new().unwrap();
        let vault = VaultDir::new(temp_dir.path());

        let path = vault.create_file("timeline.md", "t1\nt2").await.unwrap();
        assert_eq!(path, temp_dir.path().join("timeline.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "t1\nt2");
    }

    #[tokio::test]
    async fn test_vault_dir_refuses_existing_note() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("timeline.md"), "old").unwrap();
        let vault = VaultDir::new(temp_dir.path());

        let result = vault.create_file("timeline.md", "new").await;
        assert!(matches!(result, Err(NoteError::AlreadyExists(_))));
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("timeline.md")).unwrap(),
            "old"
        );
    }

    #[tokio::test]
    async fn test_memory_vault_refuses_existing_note() {
        let vault = MemoryVault::new();
        vault.create_file("a.md", "one").await.unwrap();

        assert!(vault.create_file("a.md", "two").await.is_err());
        assert_eq!(vault.get("a.md").as_deref(), Some("one"));
        assert_eq!(vault.paths(), vec!["a.md"]);
    }
}
