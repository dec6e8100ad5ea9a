use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Chat
        .route("/chat", post(handlers::chat))
        // History browsing
        .route("/users/:user_id/sessions", get(handlers::list_sessions))
        .route(
            "/users/:user_id/sessions/:session_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route(
            "/users/:user_id/history",
            axum::routing::delete(handlers::clear_history),
        )
        .route("/users/:user_id/stats", get(handlers::get_stats))
        // Browser front-end runs on another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
