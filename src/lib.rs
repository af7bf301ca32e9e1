// Library crate for the suite runner
// Exports modules for use by the server and scheduler binaries and tests

pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod telemetry;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{delete_result, get_result, list_results, run_suite};
use crate::middlewares::auth_middleware;
use crate::state::AppState;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .route("/api/test-suites/{id}/run", post(run_suite))
        .route("/api/test-results", get(list_results))
        .route("/api/test-results/{id}", get(get_result).delete(delete_result))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(|| async { "Suite runner is up" }))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
