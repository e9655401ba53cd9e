//! Route handlers for the CampusSwap API.

pub mod auth;
pub mod health;
pub mod items;
pub mod messages;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted request body (multipart listing uploads).
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth::router())
        .nest("/items", items::router())
        .nest("/messages", messages::router());

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
