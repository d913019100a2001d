//! The decrypted conversation model.
//!
//! A [`Conversation`] is what an exporter produces and what the client
//! encrypts before upload. `metadata` fields are opaque JSON bags defined
//! by the exporter; they are stored and returned verbatim, never
//! interpreted. All timestamps except the server-assigned `imported_at`
//! are opaque exporter-defined strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human participant.
    User,
    /// The AI model.
    Assistant,
    /// A system or tool injection.
    System,
}

impl Role {
    /// The lowercase wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse a lowercase wire name back into a role.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message author.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Render order within the conversation, ascending.
    pub position: i64,
    /// Opaque exporter-defined key-value bag.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Exporter-supplied creation timestamp, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A full conversation as exported from an AI chat platform.
///
/// `external_id` is the platform's own identifier and is only unique per
/// `(organization, platform)`; the server assigns its own id on ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Source platform, e.g. `"chatgpt"` or `"claude"`. Open set - new
    /// exporters mint new names.
    pub platform: String,
    /// The platform's identifier for this conversation.
    pub external_id: String,
    /// Conversation title.
    pub title: String,
    /// Model name, when the exporter knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Link back to the conversation on the source platform.
    pub source_url: String,
    /// Messages in `position` order.
    pub messages: Vec<Message>,
    /// Opaque exporter-defined key-value bag.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Exporter-supplied creation timestamp.
    pub created_at: String,
    /// When the exporter captured this conversation.
    pub exported_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_conversation() -> Conversation {
        Conversation {
            platform: "claude".into(),
            external_id: "conv-123".into(),
            title: "Rust lifetimes".into(),
            model: Some("claude-3".into()),
            source_url: "https://example.com/c/123".into(),
            messages: vec![
                Message {
                    role: Role::User,
                    content: "What is a lifetime?".into(),
                    position: 0,
                    metadata: serde_json::json!({}),
                    created_at: Some("2025-01-01T00:00:00Z".into()),
                },
                Message {
                    role: Role::Assistant,
                    content: "A lifetime names a region of borrow validity.".into(),
                    position: 1,
                    metadata: serde_json::json!({"tokens": 12}),
                    created_at: None,
                },
            ],
            metadata: serde_json::json!({"folder": "learning"}),
            created_at: "2025-01-01T00:00:00Z".into(),
            exported_at: "2025-02-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }

    #[test]
    fn role_parse_round_trips() {
        for role in [Role::User, Role::Assistant, Role::System] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("tool"), None);
    }

    #[test]
    fn conversation_json_round_trips() {
        let conv = sample_conversation();
        let json = serde_json::to_string(&conv).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conv);
    }

    #[test]
    fn missing_optional_fields_default() {
        // Exporters may omit model, metadata and message timestamps.
        let json = r#"{
            "platform": "chatgpt",
            "external_id": "x",
            "title": "t",
            "source_url": "https://example.com",
            "messages": [{"role": "user", "content": "hi", "position": 0}],
            "created_at": "2025-01-01",
            "exported_at": "2025-01-02"
        }"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conv.model, None);
        assert!(conv.metadata.is_null());
        assert_eq!(conv.messages[0].created_at, None);
    }

    #[test]
    fn metadata_survives_verbatim() {
        // Arbitrary nested shapes must pass through untouched.
        let mut conv = sample_conversation();
        conv.metadata = serde_json::json!({"a": [1, {"b": null}], "c": "d"});
        let json = serde_json::to_string(&conv).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata, conv.metadata);
    }
}
