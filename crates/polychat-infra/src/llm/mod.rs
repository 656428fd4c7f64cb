//! Upstream provider implementations.
//!
//! Contains the concrete [`UpstreamProvider`] backends: a chat-completions
//! client shared by OpenAI and Perplexity, and a Gemini `generateContent`
//! client. Also provides the provider factory ([`create_provider`]), the
//! registry builder used by the proxy ([`build_registry`]), and the
//! connectivity probe behind `POST /api/test` ([`probe_provider`]).
//!
//! [`UpstreamProvider`]: polychat_core::provider::upstream::UpstreamProvider

pub mod chat_completions;
pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use polychat_core::provider::box_provider::BoxUpstreamProvider;
use polychat_core::provider::normalize::extract_error_message;
use polychat_core::provider::registry::ProviderRegistry;
use polychat_types::config::{ProviderSettings, ProxyConfig};
use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;
use polychat_types::proxy::{GenerationParams, ProviderRequest};

use crate::secret::Credentials;

use self::chat_completions::ChatCompletionsProvider;
use self::gemini::GeminiProvider;

/// Prompt sent by the connectivity probe.
pub const PROBE_MESSAGE: &str = "Hello, respond with just 'API working'";

const PROBE_MAX_TOKENS: u32 = 50;

/// Status reported when an upstream answers 2xx with a body we cannot use.
const BAD_GATEWAY: u16 = 502;

const EMBEDDED_ERROR_STATUS: u16 = 400;

/// Create the backend for one provider.
///
/// `api_key` of `None` still yields a provider: it reports itself as not
/// configured and rejects every call without touching the network.
pub fn create_provider(
    id: ProviderId,
    settings: ProviderSettings,
    api_key: Option<SecretString>,
) -> Result<BoxUpstreamProvider, reqwest::Error> {
    let provider = match id {
        ProviderId::OpenAi => BoxUpstreamProvider::new(ChatCompletionsProvider::openai(api_key, settings)?),
        ProviderId::Perplexity => {
            BoxUpstreamProvider::new(ChatCompletionsProvider::perplexity(api_key, settings)?)
        }
        ProviderId::Gemini => BoxUpstreamProvider::new(GeminiProvider::new(api_key, settings)?),
    };
    Ok(provider)
}

/// Build a registry holding every known provider.
pub fn build_registry(
    config: &ProxyConfig,
    credentials: &Credentials,
) -> Result<ProviderRegistry, reqwest::Error> {
    let mut registry = ProviderRegistry::new();
    for id in ProviderId::ALL {
        registry.register(create_provider(id, config.provider(id), credentials.get(id))?);
    }
    Ok(registry)
}

/// Send a minimal request to verify a provider's credential and endpoint.
pub async fn probe_provider(registry: &ProviderRegistry, id: ProviderId) -> Result<String, ProxyError> {
    let request = ProviderRequest::from_message(PROBE_MESSAGE).with_params(GenerationParams {
        max_tokens: Some(PROBE_MAX_TOKENS),
        ..Default::default()
    });
    registry.complete(id, &request).await
}

/// Build a reqwest client with the provider's per-call timeout.
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

pub(crate) fn missing_credential(provider: ProviderId) -> ProxyError {
    ProxyError::MissingCredential {
        provider,
        env_var: provider.api_key_env(),
    }
}

/// Classify a reqwest failure that happened before any usable response.
pub(crate) fn transport_error(provider: ProviderId, err: &reqwest::Error, timeout_secs: u64) -> ProxyError {
    if err.is_timeout() {
        return ProxyError::Timeout {
            provider,
            timeout_secs,
        };
    }
    let detail = extract_error_message(None, Some(&err.to_string()));
    ProxyError::Transport {
        provider,
        message: format!("{} request failed: {detail}", provider.display_name()),
    }
}

/// Send a prepared request and return the raw success body.
///
/// Non-2xx statuses become [`ProxyError::Upstream`] with the status
/// forwarded and the message picked from the error body.
pub(crate) async fn send_for_body(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
    timeout_secs: u64,
) -> Result<String, ProxyError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, &e, timeout_secs))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, &e, timeout_secs))?;

    if !status.is_success() {
        return Err(ProxyError::Upstream {
            provider,
            status: status.as_u16(),
            message: extract_error_message(Some(&body), Some(status.canonical_reason().unwrap_or_default())),
        });
    }

    Ok(body)
}

/// A 2xx body that could not be decoded.
pub(crate) fn undecodable_body(provider: ProviderId, err: &serde_json::Error) -> ProxyError {
    ProxyError::Upstream {
        provider,
        status: BAD_GATEWAY,
        message: format!("invalid response from {}: {err}", provider.display_name()),
    }
}

/// A 2xx body that carries an error object instead of a reply.
pub(crate) fn embedded_error(provider: ProviderId, body: &str) -> ProxyError {
    ProxyError::Upstream {
        provider,
        status: EMBEDDED_ERROR_STATUS,
        message: extract_error_message(Some(body), None),
    }
}

/// Resolve the effective generation parameters for one call.
pub(crate) struct Effective {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Effective {
    pub(crate) fn resolve(settings: &ProviderSettings, params: &GenerationParams) -> Self {
        Self {
            model: params
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| settings.model.clone()),
            max_tokens: params.max_tokens.unwrap_or(settings.max_tokens),
            temperature: params.temperature.unwrap_or(settings.temperature),
        }
    }
}
