//! The local decrypted mirror.
//!
//! An in-memory SQLite database holding every conversation the sync
//! engine has decrypted, plus an FTS5 index over message content. This is
//! the only store the querying side reads; it never talks to the network.
//! Durability is layered on top: [`Mirror::export_snapshot`] serializes
//! the whole database to bytes and a
//! [`SnapshotStore`](crate::persist::SnapshotStore) keeps them.
//!
//! All user-influenced values are bound as parameters; SQL text is never
//! assembled from user input.

mod query;
mod search;
mod snapshot;

pub use query::{ConversationDetail, ConversationSummary, MirrorMessage};
pub use search::SearchHit;

use pool_types::Conversation;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Errors produced by the mirror.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// SQLite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error while snapshotting.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata could not be serialized or parsed.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Handle to the local mirror database.
///
/// Owned by the session and passed by reference to the sync engine
/// (writer) and to query callers (readers). Writes take `&mut self`, so
/// the borrow checker enforces the single-writer rule.
pub struct Mirror {
    conn: Connection,
}

impl Mirror {
    /// Open a fresh, empty in-memory mirror.
    pub fn open_in_memory() -> Result<Self, MirrorError> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Insert one decrypted conversation with its messages and index
    /// entries, all or nothing.
    ///
    /// Idempotent: when a conversation with the same `external_id` is
    /// already present this is a no-op returning `false`. That guards the
    /// crash/retry path, where the server may hand out the same row twice
    /// across re-fetched pages.
    pub fn insert_conversation(
        &mut self,
        conversation: &Conversation,
        server_id: &str,
        imported_at: &str,
    ) -> Result<bool, MirrorError> {
        let tx = self.conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM conversation WHERE external_id = ?1",
                params![conversation.external_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO conversation (id, platform, external_id, title, model, source_url,
                                       message_count, created_at, exported_at, imported_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                server_id,
                conversation.platform,
                conversation.external_id,
                conversation.title,
                conversation.model,
                conversation.source_url,
                conversation.messages.len() as i64,
                conversation.created_at,
                conversation.exported_at,
                imported_at,
                serde_json::to_string(&conversation.metadata)?,
            ],
        )?;

        for msg in &conversation.messages {
            tx.execute(
                "INSERT INTO message (conversation_id, role, content, position, created_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    server_id,
                    msg.role.as_str(),
                    msg.content,
                    msg.position,
                    msg.created_at,
                    serde_json::to_string(&msg.metadata)?,
                ],
            )?;
            let message_id = tx.last_insert_rowid();

            // Index in lockstep; a message row without an FTS row would be
            // invisible to search.
            tx.execute(
                "INSERT INTO message_fts (content, conversation_id, message_id)
                 VALUES (?1, ?2, ?3)",
                params![msg.content, server_id, message_id],
            )?;
        }

        tx.commit()?;
        Ok(true)
    }

    /// Number of conversations currently mirrored.
    pub fn conversation_count(&self) -> Result<u64, MirrorError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM conversation", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn apply_schema(conn: &Connection) -> Result<(), MirrorError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS conversation (
             id TEXT PRIMARY KEY,
             platform TEXT NOT NULL,
             external_id TEXT NOT NULL UNIQUE,
             title TEXT NOT NULL,
             model TEXT,
             source_url TEXT,
             message_count INTEGER NOT NULL DEFAULT 0,
             created_at TEXT NOT NULL,
             exported_at TEXT NOT NULL,
             imported_at TEXT NOT NULL,
             metadata TEXT
         );

         CREATE TABLE IF NOT EXISTS message (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             conversation_id TEXT NOT NULL REFERENCES conversation(id),
             role TEXT NOT NULL,
             content TEXT NOT NULL,
             position INTEGER NOT NULL,
             created_at TEXT,
             metadata TEXT
         );

         CREATE INDEX IF NOT EXISTS idx_msg_conv ON message(conversation_id);

         CREATE VIRTUAL TABLE IF NOT EXISTS message_fts USING fts5(
             content,
             conversation_id UNINDEXED,
             message_id UNINDEXED
         );",
    )?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::conversation;
    use super::*;

    #[test]
    fn insert_and_count() {
        let mut mirror = Mirror::open_in_memory().unwrap();
        assert_eq!(mirror.conversation_count().unwrap(), 0);

        let inserted = mirror
            .insert_conversation(&conversation("c-1", "First", &["hi", "hello"]), "srv-1", "t1")
            .unwrap();
        assert!(inserted);
        assert_eq!(mirror.conversation_count().unwrap(), 1);
    }

    #[test]
    fn insert_is_idempotent_on_external_id() {
        let mut mirror = Mirror::open_in_memory().unwrap();
        let conv = conversation("c-1", "First", &["hi", "hello"]);

        assert!(mirror.insert_conversation(&conv, "srv-1", "t1").unwrap());
        // Same external_id again, even with a different server id.
        assert!(!mirror.insert_conversation(&conv, "srv-2", "t2").unwrap());

        assert_eq!(mirror.conversation_count().unwrap(), 1);
        let messages: i64 = mirror
            .conn
            .query_row("SELECT COUNT(*) FROM message", [], |r| r.get(0))
            .unwrap();
        assert_eq!(messages, 2, "message rows must not duplicate");
        let fts_rows: i64 = mirror
            .conn
            .query_row("SELECT COUNT(*) FROM message_fts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fts_rows, 2, "index rows must not duplicate");
    }

    #[test]
    fn fts_has_no_orphaned_entries() {
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror
            .insert_conversation(&conversation("c-1", "First", &["alpha", "beta"]), "srv-1", "t1")
            .unwrap();

        let orphans: i64 = mirror
            .conn
            .query_row(
                "SELECT COUNT(*) FROM message_fts f
                 WHERE NOT EXISTS (SELECT 1 FROM conversation c WHERE c.id = f.conversation_id)",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn message_count_matches_messages() {
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror
            .insert_conversation(
                &conversation("c-3", "Three", &["one", "two", "three"]),
                "srv-3",
                "t1",
            )
            .unwrap();
        let stored: i64 = mirror
            .conn
            .query_row(
                "SELECT message_count FROM conversation WHERE id = 'srv-3'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(stored, 3);
    }
}
