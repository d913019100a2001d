//! # chatpool-types
//!
//! Data model and wire format types for the chatpool encrypted sync
//! protocol.
//!
//! This crate provides the foundational types used across all chatpool
//! crates:
//! - [`Conversation`], [`Message`], [`Role`] - the decrypted data model
//! - Request/response bodies for the JSON-over-HTTP protocol
//! - [`encoding`] - base64 helpers for salts, nonces and ciphertext
//!
//! The server only ever handles the wire types; the decrypted model never
//! crosses the network in the clear.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod auth;
pub mod encoding;
mod records;

pub use api::{
    CreateOrgRequest, ErrorBody, ImportConversationRequest, ImportOutcome, OrgSummary,
    RemoteConversation, SaltResponse, SyncPage,
};
pub use records::{Conversation, Message, Role};
