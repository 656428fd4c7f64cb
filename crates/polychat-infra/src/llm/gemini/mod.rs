//! Gemini backend over the `generateContent` REST endpoint.
//!
//! Gemini takes the key as a `key` query parameter, so the request URL is
//! never logged.

pub mod types;

use secrecy::{ExposeSecret, SecretString};

use polychat_core::provider::normalize::reply_or_placeholder;
use polychat_core::provider::upstream::UpstreamProvider;
use polychat_types::config::ProviderSettings;
use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;
use polychat_types::proxy::{MessageRole, ProviderRequest};

use super::{Effective, embedded_error, http_client, missing_credential, send_for_body, undecodable_body};

use self::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    settings: ProviderSettings,
}

impl GeminiProvider {
    pub fn new(api_key: Option<SecretString>, settings: ProviderSettings) -> Result<Self, reqwest::Error> {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client: http_client(settings.timeout_secs)?,
            api_key,
            base_url,
            settings,
        })
    }

    fn to_wire_request(&self, request: &ProviderRequest) -> (String, GenerateContentRequest) {
        let effective = Effective::resolve(&self.settings, &request.params);

        let text_part = |text: &str| Part {
            text: Some(text.to_string()),
        };

        let system_parts: Vec<Part> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| text_part(&m.content))
            .collect();

        let contents = request
            .messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                    MessageRole::System => return None,
                };
                Some(Content {
                    role: Some(role.to_string()),
                    parts: vec![text_part(&m.content)],
                })
            })
            .collect();

        let body = GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then_some(Content {
                role: None,
                parts: system_parts,
            }),
            generation_config: GenerationConfig {
                max_output_tokens: effective.max_tokens,
                temperature: effective.temperature,
            },
        };
        (effective.model, body)
    }
}

impl UpstreamProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<String, ProxyError> {
        let id = ProviderId::Gemini;
        let Some(api_key) = &self.api_key else {
            return Err(missing_credential(id));
        };

        let (model, body) = self.to_wire_request(request);
        tracing::debug!(provider = %id, model = %model, "sending generateContent");

        let http = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .query(&[("key", api_key.expose_secret())])
            .json(&body);
        let raw = send_for_body(id, http, self.settings.timeout_secs).await?;

        let parsed: GenerateContentResponse =
            serde_json::from_str(&raw).map_err(|e| undecodable_body(id, &e))?;
        if parsed.error.is_some() {
            return Err(embedded_error(id, &raw));
        }

        Ok(reply_or_placeholder(id, parsed.first_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polychat_types::proxy::{ChatMessage, GenerationParams};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, key: Option<&str>) -> GeminiProvider {
        let settings = ProviderSettings {
            base_url: Some(server.uri()),
            ..ProviderSettings::defaults_for(ProviderId::Gemini)
        };
        GeminiProvider::new(key.map(SecretString::from), settings).unwrap()
    }

    #[tokio::test]
    async fn test_gemini_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash-latest:generateContent"))
            .and(query_param("key", "g-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {"maxOutputTokens": 1000}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello from Gemini"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider(&server, Some("g-key"))
            .complete(&ProviderRequest::from_message("hello"))
            .await
            .unwrap();
        assert_eq!(reply, "Hello from Gemini");
    }

    #[tokio::test]
    async fn test_gemini_no_candidates_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let reply = provider(&server, Some("g-key"))
            .complete(&ProviderRequest::from_message("hello"))
            .await
            .unwrap();
        assert_eq!(reply, "No response from Gemini");
    }

    #[tokio::test]
    async fn test_gemini_error_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server, Some("bad"))
            .complete(&ProviderRequest::from_message("hello"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(err.to_string(), "API key not valid");
    }

    #[tokio::test]
    async fn test_gemini_missing_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server, None)
            .complete(&ProviderRequest::from_message("hello"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing GEMINI_API_KEY");
    }

    #[test]
    fn test_roles_mapped_and_system_split_out() {
        let server_less = GeminiProvider::new(None, ProviderSettings::defaults_for(ProviderId::Gemini)).unwrap();
        let request = ProviderRequest {
            messages: vec![
                ChatMessage::system("Be brief."),
                ChatMessage::user("hi"),
                ChatMessage {
                    role: MessageRole::Assistant,
                    content: "hello".into(),
                },
            ],
            params: GenerationParams {
                model: Some("gemini-pro".into()),
                ..Default::default()
            },
        };
        let (model, body) = server_less.to_wire_request(&request);
        assert_eq!(model, "gemini-pro");
        let roles: Vec<_> = body.contents.iter().map(|c| c.role.clone().unwrap()).collect();
        assert_eq!(roles, vec!["user", "model"]);
        let system = body.system_instruction.unwrap();
        assert_eq!(system.parts[0].text.as_deref(), Some("Be brief."));
    }
}
