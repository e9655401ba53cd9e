//! First-party bearer tokens.
//!
//! Whatever identity provider authenticated the user, the API hands out its
//! own signed token and trusts only that on subsequent requests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Token lifetime in days.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Claims carried by a first-party token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's external uid.
    pub sub: String,
    pub email: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Build claims for a user with the given lifetime.
    pub fn new(uid: String, email: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: uid,
            email,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Signs and verifies first-party bearer tokens (HS256).
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    /// Create a signer from the shared secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    /// Issue a token for a user, valid for [`TOKEN_TTL_DAYS`].
    pub fn issue(&self, uid: &str, email: &str) -> Result<String> {
        let claims = Claims::new(
            uid.to_string(),
            email.to_string(),
            Duration::days(TOKEN_TTL_DAYS),
        );
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }
}
