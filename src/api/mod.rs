//! API module
//!
//! HTTP API endpoints, middleware, and router assembly.

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::store::LedgerStore;

pub mod middleware;
pub mod routes;

pub use middleware::AccessGate;
pub use routes::create_router;

/// Shared application state: the ledger store behind its interface (the
/// services must not depend on which backend is in use) and the access gate.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub gate: AccessGate,
}

/// Assemble the full application: open health endpoint, gated API routes,
/// request logging, CORS and tracing.
pub fn build_app(state: AppState) -> Router {
    // Axum layers run in reverse order of addition: logging -> auth -> handler
    let api_routes = create_router()
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
