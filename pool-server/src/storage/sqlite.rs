//! SQLite storage backend.

use super::{InsertConversation, OrgRecord, StoredConversation};
use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// SQLite-based org and conversation storage.
///
/// Uses WAL mode for concurrent reads/writes.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create storage from a database path, creating the file if missing.
    pub async fn new(path: &Path) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(path.to_str().unwrap_or("chatpool.db"))
            .map_err(StorageError::Database)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Create an in-memory storage (for testing).
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(":memory:")
            .map_err(StorageError::Database)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    async fn run_migrations(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS org (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                salt BLOB NOT NULL,
                auth_key_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS encrypted_conversation (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL REFERENCES org(id),
                nonce BLOB NOT NULL,
                ciphertext BLOB NOT NULL,
                platform TEXT NOT NULL,
                external_id TEXT NOT NULL,
                imported_at TEXT NOT NULL,
                UNIQUE(org_id, platform, external_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conv_org_imported
             ON encrypted_conversation(org_id, imported_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(())
    }

    /// Create an organization. The caller has already checked the slug is
    /// free; a race on the UNIQUE constraint still comes back as an error.
    pub async fn create_org(
        &self,
        name: &str,
        slug: &str,
        salt: &[u8],
        auth_key_hash: &str,
    ) -> StorageResult<OrgRecord> {
        let record = OrgRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
            salt: salt.to_vec(),
            auth_key_hash: auth_key_hash.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        sqlx::query(
            r#"
            INSERT INTO org (id, name, slug, salt, auth_key_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.slug)
        .bind(&record.salt)
        .bind(&record.auth_key_hash)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(record)
    }

    /// Look up an organization by slug.
    pub async fn get_org_by_slug(&self, slug: &str) -> StorageResult<Option<OrgRecord>> {
        let row = sqlx::query_as::<_, OrgRow>(
            r#"
            SELECT id, name, slug, salt, auth_key_hash, created_at
            FROM org WHERE slug = ?1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(row.map(OrgRow::into_record))
    }

    /// Insert one encrypted conversation, idempotently.
    ///
    /// Returns `Some(id)` on first insert and `None` when the
    /// `(org, platform, external_id)` tuple already exists. `imported_at`
    /// is assigned here, clamped strictly above the org's current maximum
    /// so the cursor sequence is monotonic even for same-instant inserts.
    pub async fn insert_conversation(
        &self,
        insert: InsertConversation,
    ) -> StorageResult<Option<String>> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Database)?;

        let max: Option<String> = sqlx::query_scalar(
            "SELECT MAX(imported_at) FROM encrypted_conversation WHERE org_id = ?1",
        )
        .bind(&insert.org_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::Database)?;

        let imported_at = next_imported_at(max.as_deref());
        let id = uuid::Uuid::new_v4().to_string();

        let inserted: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO encrypted_conversation
                (id, org_id, nonce, ciphertext, platform, external_id, imported_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(org_id, platform, external_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&id)
        .bind(&insert.org_id)
        .bind(&insert.nonce)
        .bind(&insert.ciphertext)
        .bind(&insert.platform)
        .bind(&insert.external_id)
        .bind(&imported_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StorageError::Database)?;

        tx.commit().await.map_err(StorageError::Database)?;
        Ok(inserted)
    }

    /// List rows for an org with `imported_at > after`, ascending, at
    /// most `limit` rows, plus whether more remain.
    pub async fn conversations_after(
        &self,
        org_id: &str,
        after: Option<&str>,
        limit: u32,
    ) -> StorageResult<(Vec<StoredConversation>, bool)> {
        // One extra row decides has_more without a second query.
        let probe = i64::from(limit) + 1;
        let rows = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, org_id, nonce, ciphertext, platform, external_id, imported_at
            FROM encrypted_conversation
            WHERE org_id = ?1 AND imported_at > ?2
            ORDER BY imported_at ASC
            LIMIT ?3
            "#,
        )
        .bind(org_id)
        .bind(after.unwrap_or(""))
        .bind(probe)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        let has_more = rows.len() as i64 > i64::from(limit);
        let mut conversations: Vec<StoredConversation> =
            rows.into_iter().map(ConversationRow::into_record).collect();
        conversations.truncate(limit as usize);
        Ok((conversations, has_more))
    }
}

/// Next cursor value for an org: now, or one microsecond past the current
/// maximum when the clock has not moved since the previous insert.
///
/// RFC3339 with fixed microsecond precision and a `Z` suffix compares
/// lexicographically in time order, which is what the `imported_at > ?`
/// paging predicate relies on.
fn next_imported_at(current_max: Option<&str>) -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    match current_max {
        Some(max) if !max.is_empty() && now.as_str() <= max => {
            match DateTime::parse_from_rfc3339(max) {
                Ok(parsed) => (parsed.with_timezone(&Utc) + Duration::microseconds(1))
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
                Err(_) => now,
            }
        }
        _ => now,
    }
}

/// Internal row type for SQLite queries.
#[derive(sqlx::FromRow)]
struct OrgRow {
    id: String,
    name: String,
    slug: String,
    salt: Vec<u8>,
    auth_key_hash: String,
    created_at: String,
}

impl OrgRow {
    fn into_record(self) -> OrgRecord {
        OrgRecord {
            id: self.id,
            name: self.name,
            slug: self.slug,
            salt: self.salt,
            auth_key_hash: self.auth_key_hash,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ConversationRow {
    id: String,
    org_id: String,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
    platform: String,
    external_id: String,
    imported_at: String,
}

impl ConversationRow {
    fn into_record(self) -> StoredConversation {
        StoredConversation {
            id: self.id,
            org_id: self.org_id,
            nonce: self.nonce,
            ciphertext: self.ciphertext,
            platform: self.platform,
            external_id: self.external_id,
            imported_at: self.imported_at,
        }
    }
}
