//! Session lifecycle: signup, login, import and queries.
//!
//! A [`Session`] owns the derived keys, the mirror handle and the
//! persistence adapter for one organization login. Keys are re-derived
//! from the password every session and never persisted. The mirror is an
//! explicit handle created here and passed by reference to the engine
//! and to query callers - there is no global store.

use std::sync::{Arc, Mutex};

use pool_core::{validate_password, validate_slug, ValidationError};
use pool_types::{encoding, Conversation, CreateOrgRequest, ImportConversationRequest, ImportOutcome, OrgSummary};
use thiserror::Error;

use crate::crypto::{
    self, CryptoError, DerivedKeys, KdfParams, SALT_SIZE,
};
use crate::engine::SyncEngine;
use crate::mirror::{Mirror, MirrorError};
use crate::persist::{SnapshotError, SnapshotStore, MIRROR_SNAPSHOT_KEY};
use crate::remote::{Credentials, RemoteError, RemoteStore};

/// Errors establishing or using a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A field failed boundary validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Key derivation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The remote store rejected the request.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local mirror failed.
    #[error(transparent)]
    Mirror(#[from] MirrorError),

    /// Snapshot persistence failed.
    #[error(transparent)]
    Storage(#[from] SnapshotError),

    /// Conversation could not be serialized for encryption.
    #[error("conversation encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The server returned a salt of the wrong size.
    #[error("server returned a salt of {0} bytes, expected {SALT_SIZE}")]
    BadSalt(usize),
}

/// An authenticated session against one organization.
pub struct Session {
    slug: String,
    keys: DerivedKeys,
    creds: Credentials,
    mirror: Arc<Mutex<Mirror>>,
    snapshots: Arc<dyn SnapshotStore>,
    remote: Arc<dyn RemoteStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("slug", &self.slug)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a new organization and open a session for it.
    ///
    /// Generates a fresh salt, derives the keys, and registers the slug
    /// with the digest-of-digest auth hash. The password itself never
    /// leaves this function.
    pub async fn signup(
        remote: Arc<dyn RemoteStore>,
        snapshots: Arc<dyn SnapshotStore>,
        name: &str,
        slug: &str,
        password: &str,
    ) -> Result<(Self, OrgSummary), SessionError> {
        Self::signup_with_params(remote, snapshots, name, slug, password, KdfParams::default())
            .await
    }

    /// [`Session::signup`] with explicit KDF parameters (tests).
    pub async fn signup_with_params(
        remote: Arc<dyn RemoteStore>,
        snapshots: Arc<dyn SnapshotStore>,
        name: &str,
        slug: &str,
        password: &str,
        params: KdfParams,
    ) -> Result<(Self, OrgSummary), SessionError> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        validate_slug(slug)?;
        validate_password(password)?;

        let salt = crypto::generate_salt();
        let keys = crypto::derive_keys_with_params(password, &salt, params)?;
        let bearer = crypto::hash_auth_key(keys.auth_key_material());

        let org = remote
            .create_org(&CreateOrgRequest {
                name: name.to_string(),
                slug: slug.to_string(),
                salt: encoding::to_base64(&salt),
                auth_key_hash: crypto::stored_auth_hash(&bearer),
            })
            .await?;
        tracing::info!(slug, "organization created");

        let session = Self {
            slug: slug.to_string(),
            creds: Credentials {
                org_slug: slug.to_string(),
                bearer,
            },
            keys,
            mirror: Arc::new(Mutex::new(Mirror::open_in_memory()?)),
            snapshots,
            remote,
        };
        Ok((session, org))
    }

    /// Open a session against an existing organization.
    ///
    /// Fetches the salt, re-derives the keys, probes the credentials with
    /// a one-row page fetch, then restores the mirror from the last
    /// persisted snapshot if one exists.
    pub async fn login(
        remote: Arc<dyn RemoteStore>,
        snapshots: Arc<dyn SnapshotStore>,
        slug: &str,
        password: &str,
    ) -> Result<Self, SessionError> {
        Self::login_with_params(remote, snapshots, slug, password, KdfParams::default()).await
    }

    /// [`Session::login`] with explicit KDF parameters (tests).
    pub async fn login_with_params(
        remote: Arc<dyn RemoteStore>,
        snapshots: Arc<dyn SnapshotStore>,
        slug: &str,
        password: &str,
        params: KdfParams,
    ) -> Result<Self, SessionError> {
        validate_slug(slug)?;
        validate_password(password)?;

        let salt_bytes = remote.fetch_salt(slug).await?;
        let salt: [u8; SALT_SIZE] = salt_bytes
            .try_into()
            .map_err(|v: Vec<u8>| SessionError::BadSalt(v.len()))?;
        let keys = crypto::derive_keys_with_params(password, &salt, params)?;
        let creds = Credentials {
            org_slug: slug.to_string(),
            bearer: crypto::hash_auth_key(keys.auth_key_material()),
        };

        // A wrong password surfaces here as an auth failure, before any
        // decryption is attempted.
        remote.fetch_page(&creds, None, 1).await?;

        let mirror = match snapshots.load(MIRROR_SNAPSHOT_KEY).await? {
            Some(bytes) => match Mirror::from_snapshot(&bytes) {
                Ok(mirror) => mirror,
                Err(err) => {
                    // A corrupt snapshot costs a re-sync, not the session.
                    tracing::warn!(error = %err, "snapshot unusable, starting with empty mirror");
                    Mirror::open_in_memory()?
                }
            },
            None => Mirror::open_in_memory()?,
        };
        tracing::info!(slug, "session opened");

        Ok(Self {
            slug: slug.to_string(),
            keys,
            creds,
            mirror: Arc::new(Mutex::new(mirror)),
            snapshots,
            remote,
        })
    }

    /// The organization slug this session belongs to.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Build the sync engine for this session.
    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.remote.clone(),
            self.mirror.clone(),
            self.snapshots.clone(),
            self.keys.clone(),
            self.creds.clone(),
        )
    }

    /// Handle for query callers (list / get / search). Queries never go
    /// through the engine and never block on it.
    pub fn mirror(&self) -> Arc<Mutex<Mirror>> {
        self.mirror.clone()
    }

    /// Encrypt one exported conversation and submit it to the pool.
    ///
    /// Re-submitting a conversation the pool already has returns
    /// [`ImportOutcome::Deduplicated`].
    pub async fn import_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<ImportOutcome, SessionError> {
        let plaintext = serde_json::to_string(conversation)?;
        let payload = crypto::encrypt(&plaintext, self.keys.encryption_key())?;
        let outcome = self
            .remote
            .push_conversation(
                &self.creds,
                &ImportConversationRequest {
                    nonce: encoding::to_base64(&payload.nonce),
                    ciphertext: encoding::to_base64(&payload.ciphertext),
                    platform: conversation.platform.clone(),
                    external_id: conversation.external_id.clone(),
                },
            )
            .await?;
        tracing::debug!(
            external_id = %conversation.external_id,
            created = outcome.is_created(),
            "conversation submitted"
        );
        Ok(outcome)
    }

    /// Serialize the mirror for a user-initiated backup download.
    pub fn export_backup(&self) -> Result<Vec<u8>, SessionError> {
        Ok(self.mirror.lock().unwrap().export_snapshot()?)
    }
}
