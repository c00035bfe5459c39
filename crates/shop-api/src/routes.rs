//! # Routes
//!
//! Axum router for the shop's exposed surface.

use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the application router
///
/// Routes:
/// - GET /health - Health check
/// - GET /checkout-success - Success landing page (terminal state)
/// - GET /checkout-cancel - Cancel landing page (terminal state)
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/checkout-success", get(handlers::checkout_success))
        .route("/checkout-cancel", get(handlers::checkout_cancel))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
