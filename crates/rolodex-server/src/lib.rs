//! # rolodex-server
//!
//! HTTP service holding the authoritative reveal quota for the Rolodex
//! agency/contact directory.
//!
//! It provides:
//! - **Quota API**: `GET /view-status`, `POST /track-view` and
//!   `POST /week-views`, with the daily limit re-validated on every commit
//! - **Record listings** over the CSV snapshot, with contact details masked
//!   until revealed
//! - **Layout preferences** per user
//! - **Per-client rate limiting** to protect against abuse

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod layout;
pub mod locks;
pub mod quota;
pub mod rate_limit;

pub use api::{build_router, serve, serve_listener, AppState};
pub use catalog::RecordCatalog;
pub use config::{ServerConfig, StoreBackend};
pub use error::ServerError;
