use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use rolodex_shared::protocol::LimitExceededBody;
use rolodex_shared::quota::QuotaRecord;
use rolodex_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("{0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The authoritative count is already at the daily limit. Carries the
    /// snapshot returned to the caller.
    #[error("Daily limit exceeded")]
    LimitExceeded { record: Box<QuotaRecord>, limit: u32 },

    #[error("Stale write: {0}")]
    StaleWrite(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StaleWrite { .. } => ServerError::StaleWrite(err.to_string()),
            other => ServerError::Store(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::LimitExceeded { record, limit } => {
                let body = LimitExceededBody::from_record(record, *limit);
                return (StatusCode::FORBIDDEN, Json(body)).into_response();
            }
            ServerError::StaleWrite(_) => (StatusCode::CONFLICT, self.to_string()),
            ServerError::Store(e) => {
                tracing::error!(error = %e, "Profile store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Profile store error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
