//! Dispatch round and per-provider result types.
//!
//! A [`DispatchRound`] is one user message fanned out to every configured
//! provider. Its key set is fixed when the round is created; each entry
//! starts `Pending` and moves exactly once to `Succeeded` or `Failed`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::provider::ProviderId;

/// Lifecycle status of a single provider's call within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pending,
    Succeeded,
    Failed,
}

impl ResultStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResultStatus::Pending)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Pending => write!(f, "pending"),
            ResultStatus::Succeeded => write!(f, "succeeded"),
            ResultStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one provider's call in one round.
///
/// Exactly one of `text` / `error_message` is set once the status is
/// terminal, and neither while pending. The constructors are the only way
/// to build one, so the invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderResult {
    provider: ProviderId,
    status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl ProviderResult {
    pub fn pending(provider: ProviderId) -> Self {
        Self {
            provider,
            status: ResultStatus::Pending,
            text: None,
            error_message: None,
        }
    }

    pub fn succeeded(provider: ProviderId, text: impl Into<String>) -> Self {
        Self {
            provider,
            status: ResultStatus::Succeeded,
            text: Some(text.into()),
            error_message: None,
        }
    }

    pub fn failed(provider: ProviderId, error_message: impl Into<String>) -> Self {
        Self {
            provider,
            status: ResultStatus::Failed,
            text: None,
            error_message: Some(error_message.into()),
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One user message fanned out to a fixed set of providers.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRound {
    id: Uuid,
    message: String,
    results: BTreeMap<ProviderId, ProviderResult>,
    started_at: DateTime<Utc>,
}

impl DispatchRound {
    /// Start a round with one pending entry per provider.
    ///
    /// Rejects a message that is empty after trimming, and an empty
    /// provider set.
    pub fn new(message: impl Into<String>, providers: &[ProviderId]) -> Result<Self, DispatchError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(DispatchError::EmptyMessage);
        }
        if providers.is_empty() {
            return Err(DispatchError::NoProviders);
        }

        let results = providers
            .iter()
            .map(|&p| (p, ProviderResult::pending(p)))
            .collect();

        Ok(Self {
            id: Uuid::now_v7(),
            message,
            results,
            started_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Providers taking part in this round, in display order.
    pub fn providers(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.results.keys().copied()
    }

    /// Results in display order.
    pub fn results(&self) -> impl Iterator<Item = &ProviderResult> {
        self.results.values()
    }

    pub fn result(&self, provider: ProviderId) -> Option<&ProviderResult> {
        self.results.get(&provider)
    }

    /// Record a terminal outcome for the result's provider.
    ///
    /// Returns `false` (and changes nothing) when the provider is not part
    /// of this round, the entry is already terminal, or `result` is itself
    /// pending.
    pub fn apply(&mut self, result: ProviderResult) -> bool {
        if !result.is_terminal() {
            return false;
        }
        match self.results.get_mut(&result.provider) {
            Some(entry) if !entry.is_terminal() => {
                *entry = result;
                true
            }
            _ => false,
        }
    }

    /// True once every entry has succeeded or failed.
    pub fn is_settled(&self) -> bool {
        self.results.values().all(ProviderResult::is_terminal)
    }

    pub fn pending_count(&self) -> usize {
        self.results.values().filter(|r| !r.is_terminal()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.status == ResultStatus::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_message_rejected() {
        let err = DispatchRound::new("   ", &ProviderId::ALL).unwrap_err();
        assert!(matches!(err, DispatchError::EmptyMessage));
    }

    #[test]
    fn test_new_round_is_all_pending() {
        let round = DispatchRound::new("hello", &ProviderId::ALL).unwrap();
        assert_eq!(round.results().count(), 3);
        assert!(round.results().all(|r| r.status() == ResultStatus::Pending));
        assert!(round.results().all(|r| r.text().is_none() && r.error_message().is_none()));
        assert!(!round.is_settled());
    }

    #[test]
    fn test_results_follow_display_order() {
        let round = DispatchRound::new(
            "hello",
            &[ProviderId::Perplexity, ProviderId::OpenAi, ProviderId::Gemini],
        )
        .unwrap();
        let order: Vec<_> = round.providers().collect();
        assert_eq!(order, ProviderId::ALL.to_vec());
    }

    #[test]
    fn test_apply_is_one_shot() {
        let mut round = DispatchRound::new("hello", &ProviderId::ALL).unwrap();
        assert!(round.apply(ProviderResult::succeeded(ProviderId::Gemini, "hi")));
        assert!(!round.apply(ProviderResult::failed(ProviderId::Gemini, "late")));
        assert_eq!(round.result(ProviderId::Gemini).unwrap().text(), Some("hi"));
    }

    #[test]
    fn test_apply_ignores_foreign_and_pending() {
        let mut round = DispatchRound::new("hello", &[ProviderId::OpenAi]).unwrap();
        assert!(!round.apply(ProviderResult::succeeded(ProviderId::Gemini, "x")));
        assert!(!round.apply(ProviderResult::pending(ProviderId::OpenAi)));
        assert_eq!(round.results().count(), 1);
    }

    #[test]
    fn test_settled_after_all_terminal() {
        let mut round = DispatchRound::new("hello", &ProviderId::ALL).unwrap();
        round.apply(ProviderResult::succeeded(ProviderId::OpenAi, "a"));
        round.apply(ProviderResult::failed(ProviderId::Gemini, "boom"));
        assert_eq!(round.pending_count(), 1);
        round.apply(ProviderResult::succeeded(ProviderId::Perplexity, "c"));
        assert!(round.is_settled());
        assert_eq!(round.failure_count(), 1);
    }

    #[test]
    fn test_result_serde_skips_absent_fields() {
        let json = serde_json::to_value(ProviderResult::failed(ProviderId::OpenAi, "Invalid key")).unwrap();
        assert_eq!(json["provider"], "openai");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error_message"], "Invalid key");
        assert!(json.get("text").is_none());
    }
}
