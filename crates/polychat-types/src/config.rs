//! Configuration types for the proxy and the chat client.
//!
//! `ProxyConfig` is what `polychat.toml` deserializes into; environment
//! variables are layered on top by the infra loader. All fields have
//! defaults so an empty file (or no file) is valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::provider::ProviderId;

/// Per-call upstream timeout when nothing overrides it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Rounds allowed before the upsell is shown.
pub const DEFAULT_FREE_LIMIT: u32 = 3;

pub const DEFAULT_PORT: u16 = 5000;

pub const DEFAULT_MAX_TOKENS: u32 = 1000;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Settings for one upstream provider. The credential itself is not here;
/// it is resolved separately and kept out of anything serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Model used when the caller does not name one.
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides the provider's public API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl ProviderSettings {
    /// Built-in defaults for a provider.
    pub fn defaults_for(provider: ProviderId) -> Self {
        let model = match provider {
            ProviderId::OpenAi => "gpt-4",
            ProviderId::Gemini => "gemini-1.5-flash-latest",
            ProviderId::Perplexity => "sonar-pro",
        };
        Self {
            model: model.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

/// One `[providers.<slug>]` table as written. Every field is optional;
/// anything left out comes from [`ProviderSettings::defaults_for`].
#[derive(Debug, Default, Deserialize)]
struct ProviderOverrides {
    model: Option<String>,
    timeout_secs: Option<u64>,
    base_url: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
}

impl ProviderOverrides {
    fn over(self, defaults: ProviderSettings) -> ProviderSettings {
        ProviderSettings {
            model: self.model.unwrap_or(defaults.model),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            base_url: self.base_url.or(defaults.base_url),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        }
    }
}

fn deserialize_providers<'de, D>(deserializer: D) -> Result<BTreeMap<ProviderId, ProviderSettings>, D::Error>
where
    D: Deserializer<'de>,
{
    let tables = BTreeMap::<ProviderId, ProviderOverrides>::deserialize(deserializer)?;
    Ok(tables
        .into_iter()
        .map(|(id, overrides)| (id, overrides.over(ProviderSettings::defaults_for(id))))
        .collect())
}

/// Free-tier gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageConfig {
    #[serde(default = "default_free_limit")]
    pub free_limit: u32,
}

fn default_free_limit() -> u32 {
    DEFAULT_FREE_LIMIT
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            free_limit: DEFAULT_FREE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    /// Per-provider overrides keyed by slug. Missing providers, and
    /// missing fields within a provider's table, use
    /// [`ProviderSettings::defaults_for`].
    #[serde(default, deserialize_with = "deserialize_providers")]
    pub providers: BTreeMap<ProviderId, ProviderSettings>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            usage: UsageConfig::default(),
            providers: ProviderId::ALL
                .iter()
                .map(|&p| (p, ProviderSettings::defaults_for(p)))
                .collect(),
        }
    }
}

impl ProxyConfig {
    /// Settings for a provider, falling back to built-in defaults.
    pub fn provider(&self, provider: ProviderId) -> ProviderSettings {
        self.providers
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| ProviderSettings::defaults_for(provider))
    }
}
