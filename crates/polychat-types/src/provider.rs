//! Provider identity shared by the dispatch coordinator and the proxy.
//!
//! The declaration order of [`ProviderId`] is the display order: result
//! cards are always laid out in this order, whatever order the providers
//! answer in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A third-party conversational AI provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[serde(alias = "gpt")]
    OpenAi,
    Gemini,
    Perplexity,
}

impl ProviderId {
    /// Every known provider, in display order.
    pub const ALL: [ProviderId; 3] = [ProviderId::OpenAi, ProviderId::Gemini, ProviderId::Perplexity];

    /// URL slug used in `/api/{provider}` routes and config keys.
    pub fn slug(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::Perplexity => "perplexity",
        }
    }

    /// Human-readable name for result cards and log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OpenAI",
            ProviderId::Gemini => "Gemini",
            ProviderId::Perplexity => "Perplexity",
        }
    }

    /// Prefix of this provider's environment variables (e.g. `OPENAI`).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OPENAI",
            ProviderId::Gemini => "GEMINI",
            ProviderId::Perplexity => "PERPLEXITY",
        }
    }

    /// Name of the environment variable holding this provider's credential.
    pub fn api_key_env(&self) -> String {
        format!("{}_API_KEY", self.env_prefix())
    }

    /// Placeholder reply used when the provider answers without content.
    pub fn empty_reply_placeholder(&self) -> String {
        format!("No response from {}", self.display_name())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "gpt" => Ok(ProviderId::OpenAi),
            "gemini" => Ok(ProviderId::Gemini),
            "perplexity" => Ok(ProviderId::Perplexity),
            other => Err(format!("unknown provider: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_roundtrip() {
        for id in ProviderId::ALL {
            let parsed: ProviderId = id.to_string().parse().unwrap();
            assert_eq!(id, parsed);
        }
    }

    #[test]
    fn test_gpt_alias() {
        assert_eq!("gpt".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert_eq!("GPT".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        let parsed: ProviderId = serde_json::from_str("\"gpt\"").unwrap();
        assert_eq!(parsed, ProviderId::OpenAi);
    }

    #[test]
    fn test_unknown_provider() {
        let err = "claude".parse::<ProviderId>().unwrap_err();
        assert!(err.contains("claude"));
    }

    #[test]
    fn test_display_order_is_declaration_order() {
        let mut shuffled = vec![ProviderId::Perplexity, ProviderId::OpenAi, ProviderId::Gemini];
        shuffled.sort();
        assert_eq!(shuffled, ProviderId::ALL.to_vec());
    }

    #[test]
    fn test_api_key_env() {
        assert_eq!(ProviderId::Gemini.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(
            ProviderId::Perplexity.empty_reply_placeholder(),
            "No response from Perplexity"
        );
    }
}
