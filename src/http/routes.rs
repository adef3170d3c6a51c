use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session state
        .route("/assistant", get(handlers::get_snapshot))
        // Panel lifecycle
        .route("/assistant/open", post(handlers::open_assistant))
        .route("/assistant/close", post(handlers::close_assistant))
        .route("/assistant/reconnect", post(handlers::reconnect))
        // Manual controls
        .route("/assistant/mic/start", post(handlers::start_mic))
        .route("/assistant/mic/stop", post(handlers::stop_mic))
        .route("/assistant/speech/stop", post(handlers::stop_speaking))
        // Request logging; the panel may be served from another origin
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
