//! Full-text search over mirrored message content.

use super::{Mirror, MirrorError};
use rusqlite::params;

/// Upper bound on returned hits.
const MAX_RESULTS: u32 = 50;

/// One search hit with enough context to render a result row.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The conversation the matching message belongs to.
    pub conversation_id: String,
    /// Parent conversation title.
    pub title: String,
    /// Parent conversation platform.
    pub platform: String,
    /// A window of the matching content with the match wrapped in
    /// `<mark>` tags.
    pub snippet: String,
    /// Role of the matching message.
    pub role: String,
}

/// Reduce user text to a single quoted FTS5 phrase.
///
/// FTS5 has its own query language (`AND`, `NEAR`, `*`, `column:` filters)
/// and user-typed text must never reach that parser raw. Everything that
/// is not alphanumeric becomes a token separator, and the remaining tokens
/// form one quoted phrase bound as a parameter. `None` when no token
/// survives.
fn quote_phrase(query: &str) -> Option<String> {
    let cleaned: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.is_empty() {
        None
    } else {
        Some(format!("\"{}\"", tokens.join(" ")))
    }
}

impl Mirror {
    /// Case-insensitive full-text search over message content.
    ///
    /// Returns up to 50 hits ranked by relevance, each with a highlighted
    /// snippet and the parent conversation's title and platform.
    pub fn search_messages(&self, query: &str) -> Result<Vec<SearchHit>, MirrorError> {
        let Some(phrase) = quote_phrase(query) else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn().prepare(
            "SELECT f.conversation_id, c.title, c.platform,
                    snippet(message_fts, 0, '<mark>', '</mark>', '...', 40),
                    m.role
             FROM message_fts f
             JOIN conversation c ON c.id = f.conversation_id
             JOIN message m ON m.id = f.message_id
             WHERE message_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;

        let mapped = stmt.query_map(params![phrase, MAX_RESULTS], |row| {
            Ok(SearchHit {
                conversation_id: row.get(0)?,
                title: row.get(1)?,
                platform: row.get(2)?,
                snippet: row.get(3)?,
                role: row.get(4)?,
            })
        })?;

        Ok(mapped.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
