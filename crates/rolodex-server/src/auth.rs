//! Caller identification.
//!
//! Sign-in is handled by an external identity provider whose proxy injects
//! the authenticated user id into a request header. Requests without it
//! are rejected with `401`.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use rolodex_shared::types::UserId;

use crate::config::ServerConfig;
use crate::error::ServerError;

pub fn authenticate(headers: &HeaderMap, config: &ServerConfig) -> Result<UserId, ServerError> {
    headers
        .get(config.user_header.as_str())
        .and_then(|v| v.to_str().ok())
        .and_then(UserId::parse)
        .ok_or(ServerError::Unauthenticated)
}

pub fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    // Constant-time comparison to prevent timing attacks on admin token.
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_authenticate_reads_configured_header() {
        let config = ServerConfig::default();
        let mut headers = HeaderMap::new();
        assert!(matches!(
            authenticate(&headers, &config),
            Err(ServerError::Unauthenticated)
        ));

        headers.insert("x-user-id", HeaderValue::from_static("user_9"));
        assert_eq!(authenticate(&headers, &config).unwrap().as_str(), "user_9");

        headers.insert("x-user-id", HeaderValue::from_static("  "));
        assert!(authenticate(&headers, &config).is_err());
    }

    #[test]
    fn test_admin_token() {
        let mut config = ServerConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer s3cret"));

        // Disabled without a configured token.
        assert!(verify_admin_token(&headers, &config).is_err());

        config.admin_token = Some("s3cret".into());
        assert!(verify_admin_token(&headers, &config).is_ok());

        config.admin_token = Some("other".into());
        assert!(verify_admin_token(&headers, &config).is_err());
    }
}
