//! The sync engine: replicate the remote encrypted history into the
//! local mirror.
//!
//! One engine per session. Each cycle fetches pages of encrypted rows
//! after the persisted cursor, decrypts them row by row, inserts into the
//! mirror, persists a snapshot, and only then advances the cursor - so a
//! crash at any point resumes from data that is actually on disk.
//!
//! Pages run strictly sequentially; a corrupt row never blocks the rest
//! of the page or the rest of history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use pool_core::{PageOutcome, SessionTally, SyncProgress};
use pool_types::{encoding, Conversation, RemoteConversation};
use thiserror::Error;

use crate::crypto::{self, CryptoError, DerivedKeys, NONCE_SIZE};
use crate::mirror::{Mirror, MirrorError};
use crate::persist::{cursor_key, SnapshotError, SnapshotStore, MIRROR_SNAPSHOT_KEY};
use crate::remote::{Credentials, RemoteError, RemoteStore};

/// Rows requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Errors that abort a sync cycle.
///
/// Per-row decryption failures are not here: they are absorbed, counted
/// and reported through [`SyncProgress`], unless the whole session
/// produced nothing but failures ([`SyncError::AllFailed`]).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote fetch failed (auth or transport). Cursor unchanged.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Local mirror write failed.
    #[error("mirror error: {0}")]
    Mirror(#[from] MirrorError),

    /// Snapshot persistence failed. The in-memory mirror is still valid;
    /// the cursor was not advanced for the affected page.
    #[error("storage error: {0}")]
    Storage(#[from] SnapshotError),

    /// Every fetched row across the whole session failed to decrypt.
    /// Almost always a wrong password / wrong key.
    #[error("all {failed} fetched conversations failed to decrypt; first error: {first}")]
    AllFailed {
        /// How many rows failed.
        failed: u64,
        /// The first per-row error, as a diagnostic.
        first: String,
    },
}

/// Why a single row was skipped.
#[derive(Debug, Error)]
enum RowError {
    #[error("base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("nonce must be {NONCE_SIZE} bytes")]
    BadNonce,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("conversation payload parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Replicates the remote encrypted history into the local mirror.
pub struct SyncEngine {
    remote: Arc<dyn RemoteStore>,
    mirror: Arc<Mutex<Mirror>>,
    snapshots: Arc<dyn SnapshotStore>,
    keys: DerivedKeys,
    creds: Credentials,
    page_size: u32,
    in_flight: AtomicBool,
}

impl SyncEngine {
    /// Build an engine over the given collaborators.
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        mirror: Arc<Mutex<Mirror>>,
        snapshots: Arc<dyn SnapshotStore>,
        keys: DerivedKeys,
        creds: Credentials,
    ) -> Self {
        Self {
            remote,
            mirror,
            snapshots,
            keys,
            creds,
            page_size: DEFAULT_PAGE_SIZE,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Override the page size (tests).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Run one sync cycle to completion. Returns the number of
    /// conversations imported.
    pub async fn sync(&self) -> Result<u64, SyncError> {
        self.sync_with_progress(|_| {}).await
    }

    /// Run one sync cycle, reporting cumulative progress after each page.
    ///
    /// Only one cycle runs at a time per engine; a call that arrives
    /// while one is in flight is a no-op returning `Ok(0)`.
    pub async fn sync_with_progress<F>(&self, mut on_progress: F) -> Result<u64, SyncError>
    where
        F: FnMut(&SyncProgress),
    {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("sync already in flight; ignoring");
            return Ok(0);
        }
        let result = self.run(&mut on_progress).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run<F>(&self, on_progress: &mut F) -> Result<u64, SyncError>
    where
        F: FnMut(&SyncProgress),
    {
        let cursor_key = cursor_key(&self.creds.org_slug);
        let mut after = self.starting_cursor(&cursor_key).await?;
        let mut tally = SessionTally::new();

        loop {
            let page = self
                .remote
                .fetch_page(&self.creds, after.as_deref(), self.page_size)
                .await?;

            if page.conversations.is_empty() {
                // Caught up.
                on_progress(&tally.progress(true));
                break;
            }

            let fetched = page.conversations.len() as u64;
            let (outcome, snapshot) = self.apply_page(&page.conversations, &mut tally)?;

            // Persist the mirror before the cursor: the cursor must never
            // point past data that is not durable yet.
            self.snapshots.save(MIRROR_SNAPSHOT_KEY, &snapshot).await?;
            if let Some(next) = outcome.next_cursor() {
                self.snapshots.save(&cursor_key, next.as_bytes()).await?;
                after = Some(next.to_string());
            }

            tally.absorb(fetched, &outcome);
            let done = !page.has_more;
            on_progress(&tally.progress(done));

            tracing::info!(
                fetched,
                imported = outcome.imported(),
                failed = outcome.failed(),
                done,
                "sync page complete"
            );

            if done {
                break;
            }
        }

        if tally.is_total_failure() {
            return Err(SyncError::AllFailed {
                failed: tally.failed(),
                first: tally.first_error().unwrap_or("unknown").to_string(),
            });
        }
        Ok(tally.imported())
    }

    /// Load the persisted cursor, resetting it first when the mirror is
    /// empty - a wiped local cache with a stale cursor would otherwise
    /// never re-fetch the history it no longer has.
    async fn starting_cursor(&self, cursor_key: &str) -> Result<Option<String>, SyncError> {
        let count = self.mirror.lock().unwrap().conversation_count()?;
        if count == 0 {
            self.snapshots.save(cursor_key, b"").await?;
            return Ok(None);
        }
        let stored = self.snapshots.load(cursor_key).await?;
        Ok(stored
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .filter(|s| !s.is_empty()))
    }

    /// Decrypt and mirror one page, then export the snapshot, all under
    /// one mirror lock. Returns the page outcome and the snapshot bytes
    /// to persist (saving happens outside the lock).
    fn apply_page(
        &self,
        rows: &[RemoteConversation],
        tally: &mut SessionTally,
    ) -> Result<(PageOutcome, Vec<u8>), SyncError> {
        let mut outcome = PageOutcome::new();
        let mut mirror = self.mirror.lock().unwrap();

        for row in rows {
            match self.decrypt_row(row) {
                Ok(conversation) => {
                    mirror.insert_conversation(&conversation, &row.id, &row.imported_at)?;
                    outcome.record_success(&row.imported_at);
                }
                Err(err) => {
                    tracing::warn!(id = %row.id, error = %err, "skipping conversation");
                    tally.note_error(err.to_string());
                    outcome.record_failure(&row.imported_at);
                }
            }
        }

        let snapshot = mirror.export_snapshot()?;
        Ok((outcome, snapshot))
    }

    fn decrypt_row(&self, row: &RemoteConversation) -> Result<Conversation, RowError> {
        let nonce_bytes = encoding::from_base64(&row.nonce)?;
        let nonce: [u8; NONCE_SIZE] = nonce_bytes.try_into().map_err(|_| RowError::BadNonce)?;
        let ciphertext = encoding::from_base64(&row.ciphertext)?;
        let plaintext = crypto::decrypt(&ciphertext, &nonce, self.keys.encryption_key())?;
        Ok(serde_json::from_str(&plaintext)?)
    }

    #[cfg(test)]
    fn set_in_flight(&self, value: bool) {
        self.in_flight.store(value, Ordering::SeqCst);
    }
}
