//! Chat-completions backend shared by OpenAI and Perplexity.
//!
//! Both speak the same `POST {base}/chat/completions` dialect with bearer
//! auth. They differ only in base URL and in Perplexity's default system
//! prompt, so one provider type covers both via [`ChatCompletionsProvider::openai`]
//! and [`ChatCompletionsProvider::perplexity`].
//!
//! The API key is held as a [`SecretString`] and only exposed while
//! building the `Authorization` header.

pub mod types;

use secrecy::{ExposeSecret, SecretString};

use polychat_core::provider::normalize::reply_or_placeholder;
use polychat_core::provider::upstream::UpstreamProvider;
use polychat_types::config::ProviderSettings;
use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;
use polychat_types::proxy::ProviderRequest;

use super::{Effective, embedded_error, http_client, missing_credential, send_for_body, undecodable_body};

use self::types::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

/// System prompt Perplexity gets when the caller supplies none.
pub const PERPLEXITY_SYSTEM_PROMPT: &str = "Be precise and concise.";

// No Debug derive: the struct holds a credential.
pub struct ChatCompletionsProvider {
    id: ProviderId,
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    default_system_prompt: Option<&'static str>,
    settings: ProviderSettings,
}

impl ChatCompletionsProvider {
    pub fn openai(api_key: Option<SecretString>, settings: ProviderSettings) -> Result<Self, reqwest::Error> {
        Self::build(ProviderId::OpenAi, OPENAI_BASE_URL, None, api_key, settings)
    }

    pub fn perplexity(
        api_key: Option<SecretString>,
        settings: ProviderSettings,
    ) -> Result<Self, reqwest::Error> {
        Self::build(
            ProviderId::Perplexity,
            PERPLEXITY_BASE_URL,
            Some(PERPLEXITY_SYSTEM_PROMPT),
            api_key,
            settings,
        )
    }

    fn build(
        id: ProviderId,
        default_base: &str,
        default_system_prompt: Option<&'static str>,
        api_key: Option<SecretString>,
        settings: ProviderSettings,
    ) -> Result<Self, reqwest::Error> {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| default_base.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            id,
            client: http_client(settings.timeout_secs)?,
            api_key,
            base_url,
            default_system_prompt,
            settings,
        })
    }

    fn to_wire_request(&self, request: &ProviderRequest) -> ChatCompletionRequest {
        let effective = Effective::resolve(&self.settings, &request.params);

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(prompt) = self.default_system_prompt.filter(|_| !request.has_system_message()) {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: prompt.to_string(),
            });
        }
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        }));

        ChatCompletionRequest {
            model: effective.model,
            messages,
            max_tokens: effective.max_tokens,
            temperature: effective.temperature,
        }
    }
}

impl UpstreamProvider for ChatCompletionsProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<String, ProxyError> {
        let Some(api_key) = &self.api_key else {
            return Err(missing_credential(self.id));
        };

        let body = self.to_wire_request(request);
        tracing::debug!(provider = %self.id, model = %body.model, "sending chat completion");

        let http = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&body);
        let raw = send_for_body(self.id, http, self.settings.timeout_secs).await?;

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&raw).map_err(|e| undecodable_body(self.id, &e))?;
        if parsed.error.is_some() {
            return Err(embedded_error(self.id, &raw));
        }

        Ok(reply_or_placeholder(self.id, parsed.first_text()))
    }
}
