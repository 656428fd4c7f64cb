//! Free-tier usage gate.
//!
//! Counts settled dispatch rounds against a configured free limit. The
//! counter lives in an injected [`SessionStore`] under [`ATTEMPTS_KEY`], so
//! it survives as long as the session does and is cleared only by an
//! explicit [`UsageGate::reset`].
//!
//! The limit is advisory: nothing here stops a caller from hitting the
//! proxy directly.

use std::sync::Arc;

use polychat_types::error::SessionError;

use crate::session::SessionStore;

/// Session key holding the number of rounds used.
pub const ATTEMPTS_KEY: &str = "usage.attempts_used";

pub struct UsageGate<S> {
    store: Arc<S>,
    free_limit: u32,
}

impl<S: SessionStore> UsageGate<S> {
    /// Create a gate over `store`. A limit of 0 is raised to 1.
    pub fn new(store: Arc<S>, free_limit: u32) -> Self {
        Self {
            store,
            free_limit: free_limit.max(1),
        }
    }

    pub fn free_limit(&self) -> u32 {
        self.free_limit
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn attempts_used(&self) -> Result<u32, SessionError> {
        match self.store.get(ATTEMPTS_KEY).await? {
            None => Ok(0),
            Some(raw) => raw.trim().parse().map_err(|_| SessionError::Corrupt {
                key: ATTEMPTS_KEY.to_string(),
                value: raw,
            }),
        }
    }

    /// True iff another round may start.
    pub async fn can_dispatch(&self) -> Result<bool, SessionError> {
        Ok(self.attempts_used().await? < self.free_limit)
    }

    /// Rounds left before the limit, floored at 0.
    pub async fn remaining(&self) -> Result<u32, SessionError> {
        Ok(self.free_limit.saturating_sub(self.attempts_used().await?))
    }

    /// Count one settled round. Returns the new total.
    pub async fn record_attempt(&self) -> Result<u32, SessionError> {
        let used = self.attempts_used().await?.saturating_add(1);
        self.store.set(ATTEMPTS_KEY, &used.to_string()).await?;
        tracing::debug!(attempts_used = used, free_limit = self.free_limit, "recorded attempt");
        Ok(used)
    }

    /// Back to zero. Only called on an explicit session end (logout).
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.store.clear(ATTEMPTS_KEY).await?;
        tracing::debug!("usage counter reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::test_support::MemoryStore;

    fn gate(limit: u32) -> UsageGate<MemoryStore> {
        UsageGate::new(Arc::new(MemoryStore::default()), limit)
    }

    #[tokio::test]
    async fn fresh_gate_allows_dispatch() {
        let gate = gate(3);
        assert_eq!(gate.attempts_used().await.unwrap(), 0);
        assert_eq!(gate.remaining().await.unwrap(), 3);
        assert!(gate.can_dispatch().await.unwrap());
    }

    #[tokio::test]
    async fn denies_exactly_at_limit() {
        let gate = gate(3);
        for expected in 1..=3 {
            assert!(gate.can_dispatch().await.unwrap());
            assert_eq!(gate.record_attempt().await.unwrap(), expected);
        }
        assert!(!gate.can_dispatch().await.unwrap());
        assert_eq!(gate.remaining().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remaining_floors_at_zero() {
        let gate = gate(1);
        gate.store().set(ATTEMPTS_KEY, "7").await.unwrap();
        assert_eq!(gate.remaining().await.unwrap(), 0);
        assert!(!gate.can_dispatch().await.unwrap());
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let gate = gate(2);
        gate.reset().await.unwrap();
        assert!(gate.can_dispatch().await.unwrap());

        gate.record_attempt().await.unwrap();
        gate.record_attempt().await.unwrap();
        assert!(!gate.can_dispatch().await.unwrap());

        gate.reset().await.unwrap();
        gate.reset().await.unwrap();
        assert_eq!(gate.attempts_used().await.unwrap(), 0);
        assert!(gate.can_dispatch().await.unwrap());
    }

    #[tokio::test]
    async fn zero_limit_is_clamped() {
        let gate = gate(0);
        assert_eq!(gate.free_limit(), 1);
        assert!(gate.can_dispatch().await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_counter_is_an_error() {
        let gate = gate(3);
        gate.store().set(ATTEMPTS_KEY, "lots").await.unwrap();
        let err = gate.can_dispatch().await.unwrap_err();
        assert!(matches!(err, SessionError::Corrupt { .. }));
    }
}
