//! Durable byte-blob persistence for mirror snapshots and sync cursors.
//!
//! The mirror is in-memory; whatever should survive a restart goes
//! through a [`SnapshotStore`]: save a blob under a key, load it back.
//! The filesystem implementation is the preferred mechanism; the
//! in-memory one is the fallback when no writable directory exists, and
//! the test double.
//!
//! A save failure is surfaced, never swallowed - but it only costs
//! durability: the in-memory mirror stays fully usable for the rest of
//! the session.

mod fs;
mod memory;

pub use fs::FsSnapshotStore;
pub use memory::MemorySnapshotStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Storage key for the serialized mirror database.
pub const MIRROR_SNAPSHOT_KEY: &str = "mirror.db";

/// Storage key for an organization's sync cursor.
///
/// Slugs are validated to `[a-z0-9-]+` before they get here, so the key
/// is always a safe file name.
pub fn cursor_key(org_slug: &str) -> String {
    format!("sync-cursor-{org_slug}")
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Underlying I/O failure (quota, permissions, missing directory).
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable storage location on this host.
    #[error("no storage location available: {0}")]
    Unavailable(String),
}

/// Durable blob storage: save a byte blob under a key, load it back.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist `bytes` under `key`, replacing any previous value.
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), SnapshotError>;

    /// Load the blob stored under `key`, or `None` if absent.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, SnapshotError>;
}

/// Open the preferred store (platform data directory), falling back to an
/// in-memory store when no writable location exists.
///
/// The fallback keeps the session fully working; only durability is lost,
/// and that is logged once here.
pub fn open_default_store() -> Arc<dyn SnapshotStore> {
    match FsSnapshotStore::in_data_dir() {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::warn!(error = %err, "no durable storage available, snapshots will not survive restart");
            Arc::new(MemorySnapshotStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_keys_are_per_org() {
        assert_eq!(cursor_key("my-team"), "sync-cursor-my-team");
        assert_ne!(cursor_key("a"), cursor_key("b"));
    }
}
