//! Axum router configuration with middleware.
//!
//! Routes:
//! - `POST /api/{provider}` forwards one message (`gpt` aliases `openai`)
//! - `GET /api/status` reports credential presence
//! - `POST /api/test` runs the connectivity probe
//! - `GET /health`, `GET /`
//!
//! Middleware: CORS open to any origin (browser clients call the proxy
//! directly), request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::ProxyState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/status", get(handlers::status::provider_status))
        .route("/test", post(handlers::proxy::probe))
        .route("/{provider}", post(handlers::proxy::proxy_provider));

    Router::new()
        .route("/", get(handlers::status::root))
        .route("/health", get(handlers::status::health))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
