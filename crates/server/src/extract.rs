//! Bearer-token authentication extractor.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, resolved from the `Authorization` header.
///
/// Carries the token claims only; handlers that need the full user record
/// load it by uid.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(missing_token)?;

        let token = header.strip_prefix("Bearer ").ok_or_else(missing_token)?;

        let claims = state
            .tokens
            .verify(token)
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

        Ok(AuthUser {
            uid: claims.sub,
            email: claims.email,
        })
    }
}

fn missing_token() -> ApiError {
    ApiError::Unauthorized("Invalid/Missing token".to_string())
}
