//! Error types for authentication.

use thiserror::Error;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A first-party token failed verification (bad signature, expired,
    /// malformed).
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The identity provider rejected the presented token.
    #[error("identity token rejected: {0}")]
    IdentityRejected(String),

    /// The identity provider could not be reached or is not configured.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Password hashing or verification failed.
    #[error("password hash error: {0}")]
    PasswordHash(String),
}

/// Result type for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
