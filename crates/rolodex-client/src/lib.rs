//! # rolodex-client
//!
//! Session-side quota core: a local cache of the user's daily reveal
//! budget, kept in step with the authoritative server record, and the
//! gate every reveal goes through.
//!
//! ```no_run
//! # async fn run() -> rolodex_client::Result<()> {
//! use rolodex_client::{ClientConfig, RevealOutcome, Session};
//! use rolodex_shared::types::UserId;
//!
//! let user = UserId::parse("alice").expect("non-empty id");
//! let session = Session::connect(&ClientConfig::new("http://localhost:8080", user)).await?;
//! if let RevealOutcome::Revealed { remaining } = session.gate().request_reveal("c42").await? {
//!     println!("{remaining} reveals left today");
//! }
//! session.sign_out().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gate;
pub mod reconciler;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{HttpProfileApi, ProfileApi};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, Result};
pub use gate::{RevealGate, RevealOutcome};
pub use reconciler::{Commit, QuotaReconciler};
pub use session::Session;
pub use store::QuotaStore;
