//! Storage backend for the chatpool server.
//!
//! The server stores two things: organizations (slug, salt, auth hash)
//! and opaque encrypted conversation rows keyed by
//! `(org, platform, external_id)`. It can order, deduplicate and page
//! over the rows - it can never read them.

mod sqlite;

pub use sqlite::SqliteStorage;

/// A stored organization.
#[derive(Debug, Clone)]
pub struct OrgRecord {
    /// Server-assigned id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unique slug.
    pub slug: String,
    /// 16-byte KDF salt, as registered at signup.
    pub salt: Vec<u8>,
    /// Hex digest compared against the hashed bearer token.
    pub auth_key_hash: String,
    /// When the org was created.
    pub created_at: String,
}

/// One opaque encrypted conversation row.
#[derive(Debug, Clone)]
pub struct StoredConversation {
    /// Server-assigned row id.
    pub id: String,
    /// Owning organization.
    pub org_id: String,
    /// 24-byte nonce.
    pub nonce: Vec<u8>,
    /// Ciphertext, tag included.
    pub ciphertext: Vec<u8>,
    /// Dedup key, part 1.
    pub platform: String,
    /// Dedup key, part 2.
    pub external_id: String,
    /// Server-assigned ingest timestamp; the replication cursor.
    pub imported_at: String,
}

/// Fields for inserting one encrypted conversation.
#[derive(Debug, Clone)]
pub struct InsertConversation {
    /// Owning organization.
    pub org_id: String,
    /// 24-byte nonce.
    pub nonce: Vec<u8>,
    /// Ciphertext, tag included.
    pub ciphertext: Vec<u8>,
    /// Dedup key, part 1.
    pub platform: String,
    /// Dedup key, part 2.
    pub external_id: String,
}
