//! # chatpool-client
//!
//! Client library for chatpool: pool AI-chat exports into a shared store
//! the server cannot read.
//!
//! ## Features
//!
//! - **E2E Encryption**: XChaCha20-Poly1305 with 192-bit nonces; keys
//!   derived from the shared organization password via Argon2id
//! - **Local Mirror**: decrypted conversations in an in-memory SQLite
//!   database with FTS5 search, persisted as snapshot blobs
//! - **Incremental Sync**: cursor-driven replication that survives
//!   crashes, corrupt rows and interrupted pages
//! - **Pluggable Ports**: the remote store and the snapshot store are
//!   traits, with real and mock implementations
//!
//! ## Example
//!
//! ```ignore
//! use pool_client::{FsSnapshotStore, HttpRemote, Session};
//! use std::sync::Arc;
//!
//! let remote = Arc::new(HttpRemote::new("https://pool.example.com")?);
//! let snapshots = Arc::new(FsSnapshotStore::in_data_dir()?);
//! let session = Session::login(remote, snapshots, "my-team", password).await?;
//!
//! let imported = session.engine().sync().await?;
//! let hits = session.mirror().lock().unwrap().search_messages("lifetimes")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crypto;
pub mod engine;
pub mod mirror;
pub mod persist;
pub mod remote;
pub mod session;

pub use crypto::{
    CryptoError, DerivedKeys, EncryptedPayload, KdfParams, KEY_SIZE, NONCE_SIZE, SALT_SIZE,
};
pub use engine::{SyncEngine, SyncError, DEFAULT_PAGE_SIZE};
pub use mirror::{
    ConversationDetail, ConversationSummary, Mirror, MirrorError, MirrorMessage, SearchHit,
};
pub use persist::{
    cursor_key, open_default_store, FsSnapshotStore, MemorySnapshotStore, SnapshotError,
    SnapshotStore, MIRROR_SNAPSHOT_KEY,
};
pub use remote::{Credentials, HttpRemote, MockRemote, RemoteError, RemoteStore};
pub use session::{Session, SessionError};
