//! UpstreamProvider trait definition.
//!
//! One implementation per third-party provider. Each one owns its native
//! request/response shapes and normalizes them into a plain reply string
//! or a [`ProxyError`]; nothing provider-specific leaks past this trait.

use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;
use polychat_types::proxy::ProviderRequest;

/// Trait for upstream provider backends (OpenAI, Gemini, Perplexity).
///
/// Uses native async fn in traits (RPITIT). Implementations live in
/// polychat-infra.
pub trait UpstreamProvider: Send + Sync {
    /// Which provider this backend speaks to.
    fn id(&self) -> ProviderId;

    /// Whether a server-held credential is available.
    fn is_configured(&self) -> bool;

    /// Send one request and normalize the answer.
    ///
    /// Must fail with [`ProxyError::MissingCredential`] without touching
    /// the network when `is_configured()` is false.
    fn complete(
        &self,
        request: &ProviderRequest,
    ) -> impl std::future::Future<Output = Result<String, ProxyError>> + Send;
}
