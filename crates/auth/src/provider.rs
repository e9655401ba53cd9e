//! External identity-provider verification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Identity asserted by the external provider for a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Provider subject; becomes the user's `uid`.
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies identity-provider tokens presented at login.
///
/// Object-safe so the server can hold an `Arc<dyn IdentityProvider>`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a provider token and return the identity it asserts.
    async fn verify(&self, token: &str) -> Result<IdentityClaims>;
}

/// Token-info response shape of the verification endpoint.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies tokens against an HTTP token-info endpoint.
pub struct HttpIdentityProvider {
    http: Client,
    verify_url: String,
}

impl HttpIdentityProvider {
    /// Create a provider client for the given token-info endpoint.
    pub fn new(verify_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            verify_url: verify_url.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify(&self, token: &str) -> Result<IdentityClaims> {
        let response = self
            .http
            .get(&self.verify_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::IdentityRejected(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        tracing::debug!(sub = %info.sub, "identity token verified");

        Ok(IdentityClaims {
            uid: info.sub,
            email: info.email,
            name: info.name,
            picture: info.picture,
        })
    }
}

/// Accepts one fixed token and returns fixed claims. For tests.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    token: String,
    claims: IdentityClaims,
}

impl MockIdentityProvider {
    /// Create a provider that accepts exactly `token`.
    pub fn new(token: impl Into<String>, claims: IdentityClaims) -> Self {
        Self {
            token: token.into(),
            claims,
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn verify(&self, token: &str) -> Result<IdentityClaims> {
        if token == self.token {
            Ok(self.claims.clone())
        } else {
            Err(AuthError::IdentityRejected("unknown token".to_string()))
        }
    }
}

/// Stands in when no provider is configured; every verification reports the
/// collaborator as unavailable.
#[derive(Debug, Clone, Default)]
pub struct DisabledProvider;

#[async_trait]
impl IdentityProvider for DisabledProvider {
    async fn verify(&self, _token: &str) -> Result<IdentityClaims> {
        Err(AuthError::ProviderUnavailable(
            "identity provider is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> IdentityClaims {
        IdentityClaims {
            uid: "google-uid-1".to_string(),
            email: "a@campus.edu".to_string(),
            name: Some("A Student".to_string()),
            picture: None,
        }
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockIdentityProvider::new("good-token", claims());

        let verified = provider.verify("good-token").await.unwrap();
        assert_eq!(verified, claims());

        let rejected = provider.verify("bad-token").await;
        assert!(matches!(rejected, Err(AuthError::IdentityRejected(_))));
    }

    #[tokio::test]
    async fn test_disabled_provider() {
        let provider = DisabledProvider;
        let result = provider.verify("anything").await;
        assert!(matches!(result, Err(AuthError::ProviderUnavailable(_))));
    }
}
