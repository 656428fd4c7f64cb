//! Status, health, and discovery endpoints.
//!
//! GET /api/status - Credential presence per provider
//! GET /health     - Liveness
//! GET /           - Route listing

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use polychat_types::proxy::ProviderStatusMap;

use crate::state::ProxyState;

/// GET /api/status - Which providers have a server-held credential.
///
/// Never reveals the credentials themselves.
pub async fn provider_status(State(state): State<ProxyState>) -> Json<ProviderStatusMap> {
    Json(state.registry.status())
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET / - Lists the available routes.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "polychat provider proxy",
        "endpoints": [
            "POST /api/openai",
            "POST /api/gemini",
            "POST /api/perplexity",
            "GET /api/status",
            "POST /api/test",
            "GET /health",
        ],
    }))
}
