//! Remote opaque blob store contract.
//!
//! The server only ever sees ciphertext; this module is the client's view
//! of it. The [`RemoteStore`] trait abstracts the connection mechanism so
//! the engine and session can be driven by the real HTTP backend or by
//! [`MockRemote`] in tests.

mod http;
mod mock;

pub use http::HttpRemote;
pub use mock::MockRemote;

use async_trait::async_trait;
use pool_types::{CreateOrgRequest, ImportConversationRequest, ImportOutcome, OrgSummary, SyncPage};
use thiserror::Error;

/// Remote store errors, mapped from HTTP status classes.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Missing or invalid credentials, or the org does not accept this
    /// bearer. Never retried automatically.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// No organization with that slug.
    #[error("organization not found")]
    OrgNotFound,

    /// The slug is already registered.
    #[error("organization slug already taken")]
    SlugTaken,

    /// The server rejected a malformed request field.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Network or HTTP-level failure, timeouts included. Safe to retry
    /// later from the same cursor.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response that does not fit the protocol.
    #[error("unexpected response (status {status}): {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        body: String,
    },
}

/// Per-session authentication material for remote calls.
///
/// `bearer` is the hex auth-key digest; it proves password knowledge and
/// can decrypt nothing.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Organization slug, sent as `X-Org-Slug`.
    pub org_slug: String,
    /// Bearer token, sent as `Authorization: Bearer ...`.
    pub bearer: String,
}

/// Operations the remote blob store supports. Everything the sync
/// protocol needs, and nothing else.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Look up an organization's KDF salt by slug.
    async fn fetch_salt(&self, slug: &str) -> Result<Vec<u8>, RemoteError>;

    /// Register a new organization.
    async fn create_org(&self, req: &CreateOrgRequest) -> Result<OrgSummary, RemoteError>;

    /// Submit one encrypted conversation. Duplicate
    /// `(org, platform, external_id)` tuples come back as
    /// [`ImportOutcome::Deduplicated`], not as an error.
    async fn push_conversation(
        &self,
        creds: &Credentials,
        req: &ImportConversationRequest,
    ) -> Result<ImportOutcome, RemoteError>;

    /// Fetch one page of encrypted rows with `imported_at > after`,
    /// ascending, at most `limit` rows.
    async fn fetch_page(
        &self,
        creds: &Credentials,
        after: Option<&str>,
        limit: u32,
    ) -> Result<SyncPage, RemoteError>;
}
