//! # chatpool-server
//!
//! The opaque blob store half of chatpool. It registers organizations
//! (slug, KDF salt, auth digest), ingests client-encrypted conversation
//! rows idempotently keyed by `(org, platform, external_id)`, and lists
//! them for replication, cursor-paged by a server-assigned monotonic
//! `imported_at`.
//!
//! The server never holds a decryption key and never sees plaintext; the
//! only things it can do with a row are order it, deduplicate it, and
//! hand it back.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod storage;

pub use config::{Config, ConfigError};
pub use error::{ApiError, StorageError};
pub use routes::{build_router, AppState};
pub use storage::SqliteStorage;
