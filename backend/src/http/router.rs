//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (session binding, CORS, compression,
//! tracing) and returns the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use super::handlers;
use super::session::bind_session;
use super::state::AppState;

/// Travel requests are small; anything larger is rejected before parsing.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Credentialed CORS for a single browser origin.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    match HeaderValue::from_str(allowed_origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!(origin = allowed_origin, error = %e, "ignoring invalid CORS origin");
            layer
        }
    }
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState, allowed_origin: &str) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/plan", post(handlers::plan))
        .route("/history", get(handlers::list_history))
        .route(
            "/history/{id}",
            get(handlers::get_history).delete(handlers::delete_history),
        )
        .layer(middleware::from_fn_with_state(state.clone(), bind_session))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origin))
        .with_state(state)
}
