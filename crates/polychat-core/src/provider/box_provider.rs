//! BoxUpstreamProvider -- object-safe dynamic dispatch wrapper for UpstreamProvider.
//!
//! 1. Define an object-safe `UpstreamProviderDyn` trait with boxed futures
//! 2. Blanket-impl `UpstreamProviderDyn` for all `T: UpstreamProvider`
//! 3. `BoxUpstreamProvider` wraps `Box<dyn UpstreamProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use polychat_types::error::ProxyError;
use polychat_types::provider::ProviderId;
use polychat_types::proxy::ProviderRequest;

use super::upstream::UpstreamProvider;

/// Object-safe version of [`UpstreamProvider`] with boxed futures.
pub trait UpstreamProviderDyn: Send + Sync {
    fn id(&self) -> ProviderId;

    fn is_configured(&self) -> bool;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a ProviderRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProxyError>> + Send + 'a>>;
}

impl<T: UpstreamProvider> UpstreamProviderDyn for T {
    fn id(&self) -> ProviderId {
        UpstreamProvider::id(self)
    }

    fn is_configured(&self) -> bool {
        UpstreamProvider::is_configured(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a ProviderRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProxyError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }
}

/// Type-erased upstream provider so the registry can hold every backend
/// in one collection.
pub struct BoxUpstreamProvider {
    inner: Box<dyn UpstreamProviderDyn + Send + Sync>,
}

impl BoxUpstreamProvider {
    pub fn new<T: UpstreamProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn id(&self) -> ProviderId {
        self.inner.id()
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    pub async fn complete(&self, request: &ProviderRequest) -> Result<String, ProxyError> {
        self.inner.complete_boxed(request).await
    }
}
