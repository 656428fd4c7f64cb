//! Provider proxy endpoints.
//!
//! POST /api/{provider} - Forward one message to one provider
//! POST /api/test       - Connectivity probe for one provider

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::Instrument;

use polychat_infra::llm::probe_provider;
use polychat_observe::genai_attrs::{OP_CHAT, OP_PROBE, provider_span};
use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;
use polychat_types::proxy::{ProbeRequest, ProviderRequest, ProxyReply, ProxyRequest};

use crate::http::error::AppError;
use crate::state::ProxyState;

const MESSAGE_REQUIRED: &str = "Message is required";

/// POST /api/{provider} - Forward a message using the server-held credential.
///
/// Accepts `{message}` or `{model, messages, max_tokens, temperature}`.
/// Answers `{reply}` on success and the error envelope otherwise, with the
/// HTTP status mirroring the upstream's.
pub async fn proxy_provider(
    State(state): State<ProxyState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Result<Json<ProxyReply>, AppError> {
    let id = parse_provider(&provider)?;
    let request = parse_body(id, &body)?;

    let reply = state
        .registry
        .complete(id, &request)
        .instrument(provider_span(OP_CHAT, id.slug()))
        .await?;

    Ok(Json(ProxyReply { reply }))
}

/// POST /api/test - Send a fixed prompt to one provider.
///
/// Answers `{success: true, provider, reply}` or
/// `{success: false, error: {...}}`.
pub async fn probe(State(state): State<ProxyState>, body: Bytes) -> Response {
    let outcome = async {
        let request: ProbeRequest = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
        let id = parse_provider(&request.provider)?;
        let reply = probe_provider(&state.registry, id)
            .instrument(provider_span(OP_PROBE, id.slug()))
            .await?;
        Ok::<_, AppError>((id, reply))
    }
    .await;

    match outcome {
        Ok((id, reply)) => Json(json!({
            "success": true,
            "provider": id,
            "reply": reply,
        }))
        .into_response(),
        Err(e) => (
            e.status(),
            Json(json!({
                "success": false,
                "error": e.body(),
            })),
        )
            .into_response(),
    }
}

fn parse_provider(raw: &str) -> Result<ProviderId, AppError> {
    raw.parse()
        .map_err(|_| AppError::UnknownProvider(raw.to_string()))
}

/// Normalize either body shape. An empty body counts as a missing message.
fn parse_body(provider: ProviderId, body: &[u8]) -> Result<ProviderRequest, ProxyError> {
    let invalid = |message: String| ProxyError::InvalidRequest { provider, message };

    let parsed = if body.iter().all(u8::is_ascii_whitespace) {
        ProxyRequest::default()
    } else {
        serde_json::from_slice::<ProxyRequest>(body)
            .map_err(|e| invalid(format!("Invalid request body: {e}")))?
    };

    parsed
        .into_provider_request()
        .ok_or_else(|| invalid(MESSAGE_REQUIRED.to_string()))
}
