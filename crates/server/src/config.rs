//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Secret for signing first-party tokens.
    pub jwt_secret: String,
    /// Identity-provider token-info endpoint. External login answers 503
    /// when unset.
    pub identity_verify_url: Option<String>,
    /// Image-upload endpoint. Listing creation answers 503 when unset.
    pub image_upload_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:3001` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:campus_swap.db?mode=rwc` |
    /// | `JWT_SECRET` | Token signing secret | (required) |
    /// | `IDENTITY_VERIFY_URL` | Identity token-info endpoint | (unset) |
    /// | `IMAGE_UPLOAD_URL` | Image upload endpoint | (unset) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:campus_swap.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingJwtSecret)?;

        let identity_verify_url = env::var("IDENTITY_VERIFY_URL").ok();
        let image_upload_url = env::var("IMAGE_UPLOAD_URL").ok();

        Ok(Self {
            addr,
            database_url,
            jwt_secret,
            identity_verify_url,
            image_upload_url,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,

    #[error("JWT_SECRET environment variable is required")]
    MissingJwtSecret,
}
