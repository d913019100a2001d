//! In-memory snapshot storage.
//!
//! The fallback when no filesystem location is available, and the test
//! double for engine tests. Supports failure injection so storage-error
//! paths can be exercised.

use super::{SnapshotError, SnapshotStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Snapshot store backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    blobs: HashMap<String, Vec<u8>>,
    fail_next_save: Option<String>,
    save_count: u64,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cause the next `save()` to fail with the given message.
    pub fn fail_next_save(&self, message: &str) {
        self.inner.lock().unwrap().fail_next_save = Some(message.to_string());
    }

    /// Read a stored blob synchronously (test verification).
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().blobs.get(key).cloned()
    }

    /// Number of successful saves so far (test verification).
    pub fn save_count(&self) -> u64 {
        self.inner.lock().unwrap().save_count
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), SnapshotError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.fail_next_save.take() {
            return Err(SnapshotError::Unavailable(message));
        }
        inner.blobs.insert(key.to_string(), bytes.to_vec());
        inner.save_count += 1;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, SnapshotError> {
        Ok(self.inner.lock().unwrap().blobs.get(key).cloned())
    }
}
