//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{debug, execute, health, sessions, templates, ui};
use crate::middleware::{
    logging::log_request,
    rate_limit::{rate_limit, RateLimitState},
};
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes (never rate limited)
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/sandbox", get(health::sandbox_health))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    let rate_limit_state = RateLimitState::new(state.settings.clone());

    // JSON API routes, rate limited per client address
    let api_routes = Router::new()
        .route("/execute", post(execute::execute_code))
        .route("/debug", post(debug::debug_code))
        .route("/templates", get(templates::list_templates))
        .route("/templates/:name", get(templates::get_template))
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/:id/code", put(sessions::update_session_code))
        .layer(middleware::from_fn_with_state(rate_limit_state, rate_limit));

    Router::new()
        .route("/", get(ui::index))
        .nest("/api", api_routes)
        .merge(health_routes)
        // Apply middleware layers (order matters: first added = outermost = runs first)
        .layer(create_cors_layer())
        // Custom request logging with trace IDs
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Create CORS layer with permissive settings for development
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            // Expose trace ID headers to clients
            "x-trace-id".parse().unwrap(),
            "x-request-id".parse().unwrap(),
            // Expose rate limit headers
            "x-ratelimit-limit".parse().unwrap(),
            "x-ratelimit-reset".parse().unwrap(),
            "retry-after".parse().unwrap(),
        ])
}
