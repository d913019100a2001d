//! # chatpool-core
//!
//! Pure logic for chatpool sync (no I/O, instant tests).
//!
//! This crate implements the decisions the sync engine has to make -
//! cursor advancement, progress accounting, boundary validation - without
//! any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce
//! output without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about cursor and failure handling
//!
//! The actual I/O (network, SQLite, snapshots) is performed by
//! `chatpool-client`, which consults these types between steps.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod tally;
pub mod validate;

pub use cursor::PageOutcome;
pub use tally::{SessionTally, SyncProgress};
pub use validate::{validate_password, validate_slug, ValidationError, MIN_PASSWORD_LEN};
