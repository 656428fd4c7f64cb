//! Shared state for the proxy server.
//!
//! ProxyState holds the provider registry (one backend per provider, each
//! with its server-held credential) and the effective configuration. It is
//! cheap to clone; handlers receive it through axum's `State` extractor.

use std::sync::Arc;

use polychat_core::provider::registry::ProviderRegistry;
use polychat_infra::llm::build_registry;
use polychat_infra::secret::Credentials;
use polychat_types::config::ProxyConfig;

#[derive(Clone)]
pub struct ProxyState {
    pub registry: Arc<ProviderRegistry>,
    pub config: Arc<ProxyConfig>,
}

impl ProxyState {
    /// Build every provider backend from config and credentials.
    pub fn init(config: ProxyConfig, credentials: &Credentials) -> anyhow::Result<Self> {
        let registry = build_registry(&config, credentials)?;
        Ok(Self::from_registry(registry, config))
    }

    pub fn from_registry(registry: ProviderRegistry, config: ProxyConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}
