//! Authentication endpoints and request-auth helpers.

pub mod routes;

pub use routes::{auth_routes, AuthRouteState};

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::error::{ApiError, IdentityError};
use crate::identity::{AuthUser, IdentityProvider};

/// Extract the bearer token from the Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Resolve the request's bearer token to a user, or fail with a 401.
pub async fn require_user(
    identity: &dyn IdentityProvider,
    headers: &HeaderMap,
) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Auth("missing or invalid authorization header".to_string()))?;
    identity.resolve_token(token).await.map_err(|e| match e {
        IdentityError::Unauthorized => ApiError::Auth("invalid or expired token".to_string()),
        other => ApiError::Identity(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
    }
}
