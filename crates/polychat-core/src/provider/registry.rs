//! Provider registry for runtime provider lookup.
//!
//! Holds one boxed upstream backend per [`ProviderId`]. The proxy routes
//! `POST /api/{provider}` through it, and it doubles as an in-process
//! [`ProviderClient`] for dispatching without a separate proxy.

use std::collections::BTreeMap;
use std::time::Instant;

use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;
use polychat_types::proxy::{ProviderRequest, ProviderStatusMap};

use super::box_provider::BoxUpstreamProvider;
use super::client::ProviderClient;
use super::normalize::preview;

pub struct ProviderRegistry {
    providers: BTreeMap<ProviderId, BoxUpstreamProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Register a backend under its own id, replacing any previous one.
    pub fn register(&mut self, provider: BoxUpstreamProvider) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, id: ProviderId) -> Option<&BoxUpstreamProvider> {
        self.providers.get(&id)
    }

    /// Registered providers in display order.
    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.keys().copied().collect()
    }

    /// Credential presence for every registered provider.
    pub fn status(&self) -> ProviderStatusMap {
        self.providers
            .iter()
            .map(|(id, p)| (*id, p.is_configured()))
            .collect()
    }

    /// Forward a request to one provider.
    ///
    /// An unregistered provider is treated the same as one with no
    /// credential: rejected without any network call.
    pub async fn complete(
        &self,
        id: ProviderId,
        request: &ProviderRequest,
    ) -> Result<String, ProxyError> {
        let Some(provider) = self.providers.get(&id) else {
            return Err(ProxyError::MissingCredential {
                provider: id,
                env_var: id.api_key_env(),
            });
        };

        let start = Instant::now();
        let result = provider.complete(request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(reply) => tracing::info!(
                provider = %id,
                elapsed_ms,
                preview = %preview(reply, 50),
                "upstream call succeeded"
            ),
            Err(e) => tracing::warn!(
                provider = %id,
                status = e.status(),
                elapsed_ms,
                error = %e,
                "upstream call failed"
            ),
        }

        result
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient for ProviderRegistry {
    async fn ask(&self, provider: ProviderId, message: &str) -> Result<String, ProxyError> {
        self.complete(provider, &ProviderRequest::from_message(message))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::upstream::UpstreamProvider;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoProvider {
        id: ProviderId,
        configured: bool,
        calls: Arc<AtomicUsize>,
    }

    impl UpstreamProvider for EchoProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(&self, request: &ProviderRequest) -> Result<String, ProxyError> {
            if !self.configured {
                return Err(ProxyError::MissingCredential {
                    provider: self.id,
                    env_var: self.id.api_key_env(),
                });
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}: {}", self.id, request.prompt_text()))
        }
    }

    fn registry(calls: &Arc<AtomicUsize>) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(BoxUpstreamProvider::new(EchoProvider {
            id: ProviderId::Perplexity,
            configured: false,
            calls: Arc::clone(calls),
        }));
        registry.register(BoxUpstreamProvider::new(EchoProvider {
            id: ProviderId::OpenAi,
            configured: true,
            calls: Arc::clone(calls),
        }));
        registry
    }

    #[test]
    fn test_ids_in_display_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(&calls);
        assert_eq!(registry.ids(), vec![ProviderId::OpenAi, ProviderId::Perplexity]);
    }

    #[test]
    fn test_status_reports_credential_presence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let status = registry(&calls).status();
        assert_eq!(status.get(&ProviderId::OpenAi), Some(&true));
        assert_eq!(status.get(&ProviderId::Perplexity), Some(&false));
        assert!(!status.contains_key(&ProviderId::Gemini));
    }

    #[tokio::test]
    async fn test_ask_routes_to_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(&calls);
        let reply = registry.ask(ProviderId::OpenAi, "hello").await.unwrap();
        assert_eq!(reply, "openai: hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unregistered_provider_is_missing_credential() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(&calls);
        let err = registry.ask(ProviderId::Gemini, "hello").await.unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(err.to_string(), "Missing GEMINI_API_KEY");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
