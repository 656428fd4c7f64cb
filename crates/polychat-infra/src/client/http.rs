//! [`ProviderClient`] that goes through a running polychat proxy.
//!
//! Each call is `POST {proxy}/api/{provider}` with `{"message": ...}`.
//! The proxy's error envelope is turned back into a [`ProxyError`] that
//! keeps the upstream status and message, so a failed card shows the same
//! text the proxy logged.

use std::time::Duration;

use polychat_core::provider::client::ProviderClient;
use polychat_core::provider::normalize::{extract_error_message, reply_or_placeholder};
use polychat_types::config::{DEFAULT_TIMEOUT_SECS, ProxyConfig};
use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;
use polychat_types::proxy::{ErrorEnvelope, ProviderStatusMap, ProxyReply, ProxyRequest};

/// Headroom over the slowest provider's timeout, so the proxy gets to
/// report a timeout before the client gives up.
pub const CLIENT_TIMEOUT_MARGIN_SECS: u64 = 5;

/// Client timeout when every provider uses the default upstream timeout.
pub const CLIENT_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT_SECS + CLIENT_TIMEOUT_MARGIN_SECS;

pub const DEFAULT_PROXY_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct HttpProxyClient {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpProxyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, CLIENT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    /// Client sized to outlast the slowest provider timeout in `config`.
    pub fn for_config(base_url: impl Into<String>, config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, client_timeout_secs(config))
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential presence as reported by `GET /api/status`.
    pub async fn status(&self) -> Result<ProviderStatusMap, reqwest::Error> {
        self.client
            .get(format!("{}/api/status", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    fn transport_error(&self, provider: ProviderId, err: &reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            ProxyError::Timeout {
                provider,
                timeout_secs: self.timeout_secs,
            }
        } else {
            ProxyError::Transport {
                provider,
                message: format!("could not reach proxy at {}: {err}", self.base_url),
            }
        }
    }
}

/// Largest per-provider timeout in `config` plus [`CLIENT_TIMEOUT_MARGIN_SECS`].
pub fn client_timeout_secs(config: &ProxyConfig) -> u64 {
    ProviderId::ALL
        .iter()
        .map(|&id| config.provider(id).timeout_secs)
        .max()
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
        .saturating_add(CLIENT_TIMEOUT_MARGIN_SECS)
}

impl ProviderClient for HttpProxyClient {
    async fn ask(&self, provider: ProviderId, message: &str) -> Result<String, ProxyError> {
        let response = self
            .client
            .post(format!("{}/api/{}", self.base_url, provider.slug()))
            .json(&ProxyRequest::message(message))
            .send()
            .await
            .map_err(|e| self.transport_error(provider, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(provider, &e))?;

        if status.is_success() {
            let reply = serde_json::from_str::<ProxyReply>(&body).ok().map(|r| r.reply);
            return Ok(reply_or_placeholder(provider, reply));
        }

        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            return Err(envelope.error.into());
        }

        Err(ProxyError::Upstream {
            provider,
            status: status.as_u16(),
            message: extract_error_message(Some(&body), status.canonical_reason()),
        })
    }
}
