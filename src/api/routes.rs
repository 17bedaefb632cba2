//! API Routes
//!
//! Configures the Axum router with all share service endpoints.

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{
    health_handler, redirect_handler, signature_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /api/share/signature` - Issue a JS-SDK signature package
/// - `GET /api/share/redirect` - Redirect to a whitelisted URL
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: restricted to `allowed_origins`; any origin when the list is
///   empty
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    // Configure CORS middleware
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(origin, error = %e, "skipping unparseable CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };

    // Build router with all endpoints
    Router::new()
        .route("/api/share/signature", post(signature_handler))
        .route("/api/share/redirect", get(redirect_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
