//! # rolodex-store
//!
//! Authoritative per-user profile storage.
//!
//! A profile holds the user's [`QuotaRecord`](rolodex_shared::quota::QuotaRecord)
//! and dashboard preferences. Callers read a whole profile with
//! [`ProfileStore::get`] and merge partial updates with
//! [`ProfileStore::put`]. The store itself offers no multi-call
//! transactions; read-modify-write sequences must be serialized by the
//! caller.
//!
//! Two backends are provided: [`MemoryProfileStore`] for tests and
//! throwaway instances, and [`SqliteProfileStore`] backed by a
//! `rusqlite::Connection` with versioned migrations.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod profiles;
pub mod sqlite;
pub mod traits;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use memory::MemoryProfileStore;
pub use models::{Profile, ProfilePatch};
pub use sqlite::SqliteProfileStore;
pub use traits::ProfileStore;
