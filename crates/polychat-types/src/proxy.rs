//! Wire types for the provider proxy's HTTP surface.
//!
//! Both request shapes accepted by `POST /api/{provider}` deserialize into
//! [`ProxyRequest`]: the bare `{message}` form sent by the chat client and
//! the chat-completions form `{model, messages, max_tokens, temperature}`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;

/// Role of a message in a chat payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a chat payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Optional generation parameters; omitted fields use per-provider defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Normalized outbound request handed to an upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub messages: Vec<ChatMessage>,
    pub params: GenerationParams,
}

impl ProviderRequest {
    /// A single user message with default parameters.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(message)],
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Concatenated text of the user messages, for providers that take a
    /// single prompt rather than a conversation.
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn has_system_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == MessageRole::System)
    }
}

/// Body of `POST /api/{provider}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(flatten)]
    pub params: GenerationParams,
}

impl ProxyRequest {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Normalize either body shape into a [`ProviderRequest`].
    ///
    /// A non-empty `messages` list wins over `message`. Returns `None` when
    /// neither carries any content.
    pub fn into_provider_request(self) -> Option<ProviderRequest> {
        let messages = match (self.messages, self.message) {
            (Some(messages), _) if !messages.is_empty() => messages,
            (_, Some(message)) if !message.trim().is_empty() => vec![ChatMessage::user(message)],
            _ => return None,
        };
        Some(ProviderRequest {
            messages,
            params: self.params,
        })
    }
}

/// Success body of `POST /api/{provider}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyReply {
    pub reply: String,
}

/// Uniform failure description for one provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub status: u16,
    pub message: String,
}

/// Failure body of `POST /api/{provider}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ProviderFailure,
}

/// Body of `GET /api/status`: credential presence per provider.
pub type ProviderStatusMap = BTreeMap<ProviderId, bool>;

/// Body of `POST /api/test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub provider: String,
}
