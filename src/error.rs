//! Error types for the onboarding service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Configuration-related errors (startup only).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the hosted identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The service rejected the request with a user-safe message
    /// (wrong credentials, duplicate account, weak password, bad OTP).
    #[error("{0}")]
    Rejected(String),

    /// A bearer token could not be resolved to a user.
    #[error("invalid or expired token")]
    Unauthorized,

    #[error("identity request failed: {0}")]
    Http(String),

    #[error("unexpected identity response: {0}")]
    InvalidResponse(String),
}

/// Errors from the hosted record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("row not found: {entity} for {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Top-level API error.
///
/// Maps onto the JSON envelope `{success: false, error}` with the status
/// codes of the error taxonomy: 400 validation, 401 auth, 404 catalog
/// lookup, 500 external-service failure.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Validation failure naming every missing required field.
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::Validation(format!("missing required fields: {}", fields.join(", ")))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // The service's own rejection messages are user-safe.
            Self::Identity(IdentityError::Rejected(_)) => StatusCode::BAD_REQUEST,
            Self::Identity(IdentityError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Identity(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the end user. Internal causes are recorded for
    /// operators, never surfaced verbatim.
    fn public_message(&self) -> String {
        match self {
            Self::Identity(IdentityError::Http(_) | IdentityError::InvalidResponse(_))
            | Self::Store(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.public_message(),
        }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Auth("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Identity(IdentityError::Rejected("weak password".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Identity(IdentityError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Store(StoreError::Http("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_causes_are_not_leaked() {
        let err = ApiError::Store(StoreError::Query("secret column detail".into()));
        assert_eq!(err.public_message(), "internal server error");

        let err = ApiError::Identity(IdentityError::Rejected("invalid login credentials".into()));
        assert_eq!(err.public_message(), "invalid login credentials");
    }

    #[test]
    fn missing_fields_message() {
        let err = ApiError::missing_fields(&["farmName", "address"]);
        assert_eq!(
            err.to_string(),
            "missing required fields: farmName, address"
        );
    }
}
