//! Serializing the mirror to and from a byte blob.
//!
//! The mirror lives in memory; durability means turning the whole
//! database into bytes and handing them to a
//! [`SnapshotStore`](crate::persist::SnapshotStore). SQLite's backup API
//! only copies between connections, so both directions go through a
//! scratch file in the temp directory that is removed immediately after.

use super::{apply_schema, Mirror, MirrorError};
use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("chatpool-mirror-{}.db", uuid::Uuid::new_v4()))
}

fn copy_database(from: &Connection, to: &mut Connection) -> Result<(), rusqlite::Error> {
    let backup = Backup::new(from, to)?;
    backup.run_to_completion(100, Duration::from_millis(0), None)?;
    Ok(())
}

impl Mirror {
    /// Serialize the entire mirror to a single database image.
    ///
    /// The result is also what the user downloads as a backup.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, MirrorError> {
        let path = scratch_path();
        let result = (|| -> Result<Vec<u8>, MirrorError> {
            let mut dst = Connection::open(&path)?;
            copy_database(&self.conn, &mut dst)?;
            drop(dst);
            Ok(fs::read(&path)?)
        })();
        let _ = fs::remove_file(&path);
        result
    }

    /// Rebuild a mirror from a previously exported snapshot.
    ///
    /// The schema is re-applied afterwards so a snapshot from an older
    /// build gains any tables it is missing.
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self, MirrorError> {
        let path = scratch_path();
        let result = (|| -> Result<Mirror, MirrorError> {
            fs::write(&path, bytes)?;
            let src = Connection::open(&path)?;
            let mut conn = Connection::open_in_memory()?;
            copy_database(&src, &mut conn)?;
            drop(src);
            apply_schema(&conn)?;
            Ok(Mirror { conn })
        })();
        let _ = fs::remove_file(&path);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_fixtures::conversation;
    use super::super::Mirror;

    #[test]
    fn snapshot_round_trips() {
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror
            .insert_conversation(
                &conversation("c-1", "Persisted", &["remember this line"]),
                "srv-1",
                "t1",
            )
            .unwrap();

        let bytes = mirror.export_snapshot().unwrap();
        assert!(!bytes.is_empty());
        // A SQLite database image starts with a fixed magic string.
        assert!(bytes.starts_with(b"SQLite format 3\0"));

        let restored = Mirror::from_snapshot(&bytes).unwrap();
        assert_eq!(restored.conversation_count().unwrap(), 1);
        let detail = restored.get_conversation("srv-1").unwrap().unwrap();
        assert_eq!(detail.summary.title, "Persisted");
        assert_eq!(detail.messages.len(), 1);
    }

    #[test]
    fn search_index_survives_snapshot() {
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror
            .insert_conversation(
                &conversation("c-1", "Indexed", &["the quick brown fox"]),
                "srv-1",
                "t1",
            )
            .unwrap();

        let bytes = mirror.export_snapshot().unwrap();
        let restored = Mirror::from_snapshot(&bytes).unwrap();
        let hits = restored.search_messages("quick").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].snippet.contains("<mark>quick</mark>"));
    }

    #[test]
    fn empty_mirror_snapshot_restores_empty() {
        let mirror = Mirror::open_in_memory().unwrap();
        let bytes = mirror.export_snapshot().unwrap();
        let restored = Mirror::from_snapshot(&bytes).unwrap();
        assert_eq!(restored.conversation_count().unwrap(), 0);
    }

    #[test]
    fn restored_mirror_accepts_new_inserts() {
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror
            .insert_conversation(&conversation("c-1", "One", &["a"]), "srv-1", "t1")
            .unwrap();

        let bytes = mirror.export_snapshot().unwrap();
        let mut restored = Mirror::from_snapshot(&bytes).unwrap();
        // Same external_id still deduplicates after the round trip.
        assert!(!restored
            .insert_conversation(&conversation("c-1", "One", &["a"]), "srv-9", "t9")
            .unwrap());
        assert!(restored
            .insert_conversation(&conversation("c-2", "Two", &["b"]), "srv-2", "t2")
            .unwrap());
        assert_eq!(restored.conversation_count().unwrap(), 2);
    }

    #[test]
    fn garbage_blob_is_rejected() {
        assert!(Mirror::from_snapshot(b"definitely not a database").is_err());
    }
}
