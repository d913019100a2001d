//! Request and response bodies for the JSON-over-HTTP protocol.
//!
//! Binary fields (salt, nonce, ciphertext) travel as standard base64; the
//! auth key hash travels as lowercase hex. See [`crate::encoding`].

use serde::{Deserialize, Serialize};

/// `GET /org/{slug}/salt` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaltResponse {
    /// The organization's 16-byte KDF salt, base64.
    pub salt: String,
}

/// `POST /org` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrgRequest {
    /// Display name.
    pub name: String,
    /// Unique lowercase `[a-z0-9-]+` identifier.
    pub slug: String,
    /// 16-byte KDF salt, base64.
    pub salt: String,
    /// Hex digest the server stores for authentication. This is the
    /// SHA-256 of the bearer token, not the bearer token itself.
    pub auth_key_hash: String,
}

/// `POST /org` success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgSummary {
    /// Server-assigned organization id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Slug as registered.
    pub slug: String,
    /// Server-assigned creation timestamp.
    pub created_at: String,
}

/// `POST /conversations` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConversationRequest {
    /// 24-byte encryption nonce, base64.
    pub nonce: String,
    /// Encrypted serialized conversation, base64.
    pub ciphertext: String,
    /// Source platform (part of the dedup key).
    pub platform: String,
    /// Platform conversation id (part of the dedup key).
    pub external_id: String,
}

/// Outcome of submitting one conversation to the ingestion endpoint.
///
/// Re-submitting an already stored `(org, platform, external_id)` tuple is
/// a successful no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// First insert; the server assigned this id.
    Created(String),
    /// The tuple was already present; nothing was written.
    Deduplicated,
}

impl ImportOutcome {
    /// True when the submission stored a new row.
    pub fn is_created(&self) -> bool {
        matches!(self, ImportOutcome::Created(_))
    }
}

/// One encrypted row as listed by `GET /conversations`.
///
/// Opaque to the server: it can order and deduplicate these, never read
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConversation {
    /// Server-assigned row id.
    pub id: String,
    /// 24-byte encryption nonce, base64.
    pub nonce: String,
    /// Encrypted serialized conversation, base64.
    pub ciphertext: String,
    /// Source platform.
    pub platform: String,
    /// Platform conversation id.
    pub external_id: String,
    /// Server-assigned ingest timestamp; the replication cursor.
    pub imported_at: String,
}

/// `GET /conversations` response: one page of encrypted rows, ascending by
/// `imported_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPage {
    /// The page contents.
    pub conversations: Vec<RemoteConversation>,
    /// Whether more rows exist past this page.
    pub has_more: bool,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
}

impl ErrorBody {
    /// Build an error body from any displayable reason.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_page_round_trips() {
        let page = SyncPage {
            conversations: vec![RemoteConversation {
                id: "r1".into(),
                nonce: "bm9uY2U=".into(),
                ciphertext: "Y2lwaGVy".into(),
                platform: "claude".into(),
                external_id: "c-1".into(),
                imported_at: "2025-03-01T12:00:00.000001Z".into(),
            }],
            has_more: true,
        };
        let json = serde_json::to_string(&page).unwrap();
        let back: SyncPage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.conversations.len(), 1);
        assert_eq!(back.conversations[0].external_id, "c-1");
        assert!(back.has_more);
    }

    #[test]
    fn import_outcome_created() {
        assert!(ImportOutcome::Created("abc".into()).is_created());
        assert!(!ImportOutcome::Deduplicated.is_created());
    }

    #[test]
    fn error_body_field_name() {
        let body = ErrorBody::new("Invalid credentials");
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"Invalid credentials"}"#);
    }
}
