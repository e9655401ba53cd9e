//! Application state shared across handlers.

use std::sync::Arc;

use auth::{IdentityProvider, TokenSigner};
use database::Database;
use media::ImageStore;

/// Shared application state; cheap to clone.
///
/// Every external collaborator is injected here: the database pool, the
/// token signer, the identity provider, and the image store. Nothing in the
/// request path reaches for an ambient singleton.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenSigner>,
    pub identity: Arc<dyn IdentityProvider>,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        tokens: TokenSigner,
        identity: Arc<dyn IdentityProvider>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
            identity,
            images,
        }
    }
}
