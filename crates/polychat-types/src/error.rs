use thiserror::Error;

use crate::provider::ProviderId;
use crate::proxy::ProviderFailure;

/// Errors from a single provider call through the proxy.
///
/// Every variant carries the provider it belongs to, so a failure can
/// always be rendered into that provider's card and never into a
/// sibling's.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    /// No server-held credential for the provider. Raised before any
    /// network call.
    #[error("Missing {env_var}")]
    MissingCredential { provider: ProviderId, env_var: String },

    /// The caller's payload carried no message.
    #[error("{message}")]
    InvalidRequest { provider: ProviderId, message: String },

    /// The per-call timeout elapsed.
    #[error("{provider} request timed out after {timeout_secs}s")]
    Timeout { provider: ProviderId, timeout_secs: u64 },

    /// Connection-level failure with no upstream response.
    #[error("{message}")]
    Transport { provider: ProviderId, message: String },

    /// The upstream answered with a non-success status or error payload.
    #[error("{message}")]
    Upstream {
        provider: ProviderId,
        status: u16,
        message: String,
    },
}

impl ProxyError {
    pub fn provider(&self) -> ProviderId {
        match self {
            ProxyError::MissingCredential { provider, .. }
            | ProxyError::InvalidRequest { provider, .. }
            | ProxyError::Timeout { provider, .. }
            | ProxyError::Transport { provider, .. }
            | ProxyError::Upstream { provider, .. } => *provider,
        }
    }

    /// HTTP status the proxy answers with for this error.
    pub fn status(&self) -> u16 {
        match self {
            ProxyError::MissingCredential { .. } | ProxyError::InvalidRequest { .. } => 400,
            ProxyError::Timeout { .. } | ProxyError::Transport { .. } => 500,
            ProxyError::Upstream { status, .. } => *status,
        }
    }

    pub fn to_failure(&self) -> ProviderFailure {
        ProviderFailure {
            provider: self.provider(),
            status: self.status(),
            message: self.to_string(),
        }
    }
}

impl From<ProviderFailure> for ProxyError {
    fn from(failure: ProviderFailure) -> Self {
        ProxyError::Upstream {
            provider: failure.provider,
            status: failure.status,
            message: failure.message,
        }
    }
}

/// Reasons a dispatch round is refused before any provider is called.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("no providers configured")]
    NoProviders,

    #[error("free chat limit of {free_limit} reached")]
    LimitReached { free_limit: u32 },

    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Errors from the session store backing the usage counter.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(String),

    #[error("corrupt session value for '{key}': {value}")]
    Corrupt { key: String, value: String },
}
