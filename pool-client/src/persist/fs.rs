//! Filesystem-backed snapshot storage.

use super::{SnapshotError, SnapshotStore};
use async_trait::async_trait;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// One file per key inside a data directory.
///
/// Writes go to a temp file first and are renamed into place, so a crash
/// mid-write leaves the previous snapshot intact rather than a truncated
/// one.
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    /// Store blobs under an explicit directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Store blobs in the platform data directory:
    /// - Linux:   `~/.local/share/chatpool/`
    /// - macOS:   `~/Library/Application Support/io.chatpool.chatpool/`
    /// - Windows: `{FOLDERID_RoamingAppData}\chatpool\chatpool\data\`
    pub fn in_data_dir() -> Result<Self, SnapshotError> {
        let dirs = ProjectDirs::from("io", "chatpool", "chatpool").ok_or_else(|| {
            SnapshotError::Unavailable("could not determine a platform data directory".into())
        })?;
        Self::new(dirs.data_dir())
    }

    /// The directory blobs live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), SnapshotError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(key, bytes = bytes.len(), "saved snapshot");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, SnapshotError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSnapshotStore::new(dir.path()).unwrap();

        store.save("mirror.db", b"database bytes").await.unwrap();
        let loaded = store.load("mirror.db").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"database bytes".as_slice()));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSnapshotStore::new(dir.path()).unwrap();
        assert!(store.load("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSnapshotStore::new(dir.path()).unwrap();

        store.save("k", b"one").await.unwrap();
        store.save("k", b"two").await.unwrap();
        assert_eq!(store.load("k").await.unwrap().as_deref(), Some(b"two".as_slice()));
    }

    #[tokio::test]
    async fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSnapshotStore::new(dir.path()).unwrap();
        store.save("k", b"bytes").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["k".to_string()]);
    }
}
