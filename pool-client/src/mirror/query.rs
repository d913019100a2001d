//! Read-side queries over the mirror.

use super::{Mirror, MirrorError};
use pool_types::Role;
use rusqlite::{params, OptionalExtension, Row};

/// One row of the conversation list.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    /// Server-assigned id (primary key of the mirror row).
    pub id: String,
    /// Source platform.
    pub platform: String,
    /// The platform's conversation id.
    pub external_id: String,
    /// Conversation title.
    pub title: String,
    /// Model name if the exporter knew it.
    pub model: Option<String>,
    /// Link back to the source platform.
    pub source_url: String,
    /// Number of messages in the conversation.
    pub message_count: i64,
    /// Exporter-supplied creation timestamp.
    pub created_at: String,
    /// Server-assigned ingest timestamp.
    pub imported_at: String,
}

/// A full conversation with its ordered messages and parsed metadata.
#[derive(Debug, Clone)]
pub struct ConversationDetail {
    /// The list-level fields.
    pub summary: ConversationSummary,
    /// Opaque exporter metadata, parsed back to JSON.
    pub metadata: serde_json::Value,
    /// Messages ordered by `position` ascending.
    pub messages: Vec<MirrorMessage>,
}

/// One message as stored in the mirror.
#[derive(Debug, Clone)]
pub struct MirrorMessage {
    /// Message author.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Render order within the conversation.
    pub position: i64,
    /// Exporter-supplied timestamp, if any.
    pub created_at: Option<String>,
    /// Opaque exporter metadata.
    pub metadata: serde_json::Value,
}

const SUMMARY_COLUMNS: &str = "id, platform, external_id, title, model, source_url, \
                               message_count, created_at, imported_at";

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<ConversationSummary> {
    Ok(ConversationSummary {
        id: row.get(0)?,
        platform: row.get(1)?,
        external_id: row.get(2)?,
        title: row.get(3)?,
        model: row.get(4)?,
        source_url: row.get(5)?,
        message_count: row.get(6)?,
        created_at: row.get(7)?,
        imported_at: row.get(8)?,
    })
}

fn parse_metadata(text: Option<String>) -> serde_json::Value {
    text.and_then(|t| serde_json::from_str(&t).ok())
        .unwrap_or(serde_json::Value::Null)
}

fn parse_role(text: &str) -> rusqlite::Result<Role> {
    Role::parse(text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown role: {text}").into(),
        )
    })
}

impl Mirror {
    /// List conversations, most recently created first, optionally
    /// filtered by platform, with page-based pagination.
    pub fn list_conversations(
        &self,
        platform: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, MirrorError> {
        let rows = match platform {
            Some(platform) => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {SUMMARY_COLUMNS} FROM conversation
                     WHERE platform = ?1
                     ORDER BY created_at DESC
                     LIMIT ?2 OFFSET ?3"
                ))?;
                let mapped = stmt.query_map(params![platform, limit, offset], row_to_summary)?;
                mapped.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {SUMMARY_COLUMNS} FROM conversation
                     ORDER BY created_at DESC
                     LIMIT ?1 OFFSET ?2"
                ))?;
                let mapped = stmt.query_map(params![limit, offset], row_to_summary)?;
                mapped.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    /// Fetch one conversation with ordered messages, or `None` when it is
    /// not mirrored (yet).
    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationDetail>, MirrorError> {
        let header = self
            .conn()
            .query_row(
                &format!("SELECT {SUMMARY_COLUMNS}, metadata FROM conversation WHERE id = ?1"),
                params![id],
                |row| {
                    let summary = row_to_summary(row)?;
                    let metadata: Option<String> = row.get(9)?;
                    Ok((summary, metadata))
                },
            )
            .optional()?;

        let Some((summary, metadata)) = header else {
            return Ok(None);
        };

        let mut stmt = self.conn().prepare(
            "SELECT role, content, position, created_at, metadata
             FROM message
             WHERE conversation_id = ?1
             ORDER BY position ASC",
        )?;
        let mapped = stmt.query_map(params![id], |row| {
            let role_text: String = row.get(0)?;
            let metadata: Option<String> = row.get(4)?;
            Ok(MirrorMessage {
                role: parse_role(&role_text)?,
                content: row.get(1)?,
                position: row.get(2)?,
                created_at: row.get(3)?,
                metadata: parse_metadata(metadata),
            })
        })?;
        let messages = mapped.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(ConversationDetail {
            summary,
            metadata: parse_metadata(metadata),
            messages,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_fixtures::conversation;
    use super::super::Mirror;
    use pool_types::Role;

    fn seeded() -> Mirror {
        let mut mirror = Mirror::open_in_memory().unwrap();
        let mut a = conversation("a", "Alpha", &["first question", "first answer"]);
        a.platform = "claude".into();
        a.created_at = "2025-01-01T00:00:00Z".into();
        let mut b = conversation("b", "Beta", &["second question"]);
        b.platform = "chatgpt".into();
        b.created_at = "2025-01-03T00:00:00Z".into();
        let mut c = conversation("c", "Gamma", &["third"]);
        c.platform = "claude".into();
        c.created_at = "2025-01-02T00:00:00Z".into();

        mirror.insert_conversation(&a, "srv-a", "t1").unwrap();
        mirror.insert_conversation(&b, "srv-b", "t2").unwrap();
        mirror.insert_conversation(&c, "srv-c", "t3").unwrap();
        mirror
    }

    #[test]
    fn list_orders_most_recent_first() {
        let mirror = seeded();
        let all = mirror.list_conversations(None, 50, 0).unwrap();
        let titles: Vec<_> = all.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Beta", "Gamma", "Alpha"]);
    }

    #[test]
    fn list_filters_by_platform() {
        let mirror = seeded();
        let claude = mirror.list_conversations(Some("claude"), 50, 0).unwrap();
        assert_eq!(claude.len(), 2);
        assert!(claude.iter().all(|c| c.platform == "claude"));
    }

    #[test]
    fn list_paginates() {
        let mirror = seeded();
        let page1 = mirror.list_conversations(None, 2, 0).unwrap();
        let page2 = mirror.list_conversations(None, 2, 2).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].title, "Alpha");
    }

    #[test]
    fn get_returns_ordered_messages_and_metadata() {
        let mirror = seeded();
        let detail = mirror.get_conversation("srv-a").unwrap().unwrap();
        assert_eq!(detail.summary.title, "Alpha");
        assert_eq!(detail.metadata["source"], "test");
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[0].position, 0);
        assert_eq!(detail.messages[0].role, Role::User);
        assert_eq!(detail.messages[1].position, 1);
        assert_eq!(detail.messages[1].role, Role::Assistant);
    }

    #[test]
    fn get_missing_is_none() {
        let mirror = seeded();
        assert!(mirror.get_conversation("srv-zzz").unwrap().is_none());
    }
}
