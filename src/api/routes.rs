//! Route definitions for the API.

use axum::{middleware, routing::get, Json, Router};

use super::handlers;
use super::middleware::auth::auth_middleware;
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    // Build the OpenAPI spec once at startup
    let openapi = super::openapi::build_openapi();

    Router::new()
        // Health endpoint (no auth required)
        .route("/health", get(handlers::health::health_check))
        // OpenAPI document
        .route(
            "/api/v1/openapi.json",
            get(move || {
                let doc = openapi.clone();
                async move { Json(doc) }
            }),
        )
        // API v1 routes
        .nest("/api/v1", api_v1_routes(state.clone()))
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: SharedState) -> Router<SharedState> {
    Router::new()
        // Auth routes - split into public and protected
        .nest("/auth", handlers::auth::public_router())
        .nest(
            "/auth",
            handlers::auth::protected_router().layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // User management
        .nest(
            "/users",
            handlers::users::router().layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Permission management
        .nest(
            "/permissions",
            handlers::permissions::router().layer(middleware::from_fn_with_state(
                state,
                auth_middleware,
            )),
        )
}
