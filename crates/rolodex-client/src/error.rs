use rolodex_shared::quota::QuotaRecord;
use thiserror::Error;

/// Failure of one call to the profile API, classified by what the caller
/// may do about it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not signed in")]
    Unauthenticated,

    /// The server refused the reveal; carries its authoritative counters
    /// and the limit it enforced.
    #[error("Daily limit exceeded ({} of {daily_limit} views used)", .snapshot.daily_views)]
    LimitExceeded {
        snapshot: Box<QuotaRecord>,
        daily_limit: u32,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Stale write: {0}")]
    StaleWrite(String),

    /// Network failure, timeout or server fault. Safe to retry.
    #[error("Transient failure: {0}")]
    Transient(String),
}

impl ApiError {
    pub fn transient(e: impl std::fmt::Display) -> Self {
        Self::Transient(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Contact ID required")]
    MissingContactId,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Profile API error: {0}")]
    Api(ApiError),
}

impl From<ApiError> for ClientError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Unauthenticated => ClientError::Unauthenticated,
            other => ClientError::Api(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
