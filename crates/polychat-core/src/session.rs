//! Session store trait.
//!
//! Holds session-scoped values such as the usage counter. It is injected
//! into the usage gate rather than read from ambient state, so the gate can
//! be driven deterministically in tests. Implementations live in
//! polychat-infra.

use polychat_types::error::SessionError;

/// Trait for session-scoped key-value storage.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait SessionStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, SessionError>> + Send;

    /// Set a value for a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;

    /// Remove a key. No-op if the key does not exist.
    fn clear(&self, key: &str) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
}
