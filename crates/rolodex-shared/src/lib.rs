//! # rolodex-shared
//!
//! Types shared by the Rolodex server, store and client crates: the
//! per-user [`quota::QuotaRecord`], the day-rollover policy, the HTTP wire
//! format, the agency/contact rows and the contact masking projector.

pub mod clock;
pub mod constants;
pub mod error;
pub mod projector;
pub mod protocol;
pub mod quota;
pub mod records;
pub mod rollover;
pub mod types;
