//! ProviderClient -- the dispatch coordinator's view of the proxy.
//!
//! The coordinator only needs "send this message to that provider and
//! tell me the reply or the failure". The HTTP implementation talking to
//! a remote proxy lives in polychat-infra; [`ProviderRegistry`] implements
//! it in-process.
//!
//! [`ProviderRegistry`]: super::registry::ProviderRegistry

use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;

pub trait ProviderClient: Send + Sync + 'static {
    /// Ask one provider to answer `message`.
    fn ask(
        &self,
        provider: ProviderId,
        message: &str,
    ) -> impl std::future::Future<Output = Result<String, ProxyError>> + Send;
}
