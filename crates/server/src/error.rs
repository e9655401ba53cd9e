//! Error types for the API, mapped onto HTTP statuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use auth::AuthError;
use database::message::SendError;
use database::{DatabaseError, ValidationError};
use media::MediaError;

/// Errors surfaced by route handlers.
///
/// Taxonomy: validation → 400, authentication → 401, absent or inaccessible
/// resources → 404, duplicate registration → 409, unconfigured or failing
/// upstreams → 503, everything else → 500 with a generic client message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database failure; not-found and already-exists map to their own
    /// statuses, the rest to 500.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// An external collaborator (identity provider, image storage) failed.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Database(DatabaseError::NotFound { entity, .. }) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            ApiError::Database(DatabaseError::AlreadyExists { entity, .. }) => {
                (StatusCode::CONFLICT, format!("{entity} already exists"))
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Upstream(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "success": false,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) => ApiError::Unauthorized("Invalid token".to_string()),
            AuthError::IdentityRejected(_) => {
                ApiError::Unauthorized("Authentication failed".to_string())
            }
            AuthError::ProviderUnavailable(msg) => ApiError::Upstream(msg),
            AuthError::PasswordHash(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Unavailable(msg) | MediaError::UploadFailed(msg) => {
                ApiError::Upstream(msg)
            }
            MediaError::InvalidImage(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl From<SendError> for ApiError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Invalid(e) => ApiError::BadRequest(e.to_string()),
            SendError::SelfContact => {
                ApiError::BadRequest("You cannot message yourself about your own item".to_string())
            }
            SendError::MissingTarget => {
                ApiError::BadRequest("conversationId or itemId is required".to_string())
            }
            SendError::Database(e) => ApiError::Database(e),
        }
    }
}

/// Result type for route handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
