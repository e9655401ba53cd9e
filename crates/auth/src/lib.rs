//! Authentication for CampusSwap.
//!
//! Three concerns live here:
//!
//! - first-party bearer tokens ([`TokenSigner`]): signed JWTs wrapping the
//!   user's external identity subject, issued at login and verified on
//!   every protected request;
//! - password hashing ([`password`]) for local email/password accounts;
//! - the external identity provider ([`IdentityProvider`]): verification of
//!   the token a client obtained from the upstream login flow.

pub mod error;
pub mod password;
pub mod provider;
pub mod token;

pub use error::AuthError;
pub use provider::{
    DisabledProvider, HttpIdentityProvider, IdentityClaims, IdentityProvider,
    MockIdentityProvider,
};
pub use token::{Claims, TokenSigner, TOKEN_TTL_DAYS};
