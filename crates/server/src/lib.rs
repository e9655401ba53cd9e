//! CampusSwap marketplace HTTP API.
//!
//! Routing, extraction, and error mapping live here; domain logic lives in
//! the `database`, `auth`, and `media` crates and is injected through
//! [`AppState`].

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;
