//! Render-friendly view of the current round.
//!
//! Derived state only: the coordinator feeds it, renderers read it. Cards
//! are kept in provider display order so a layout never reshuffles as
//! answers arrive.

use uuid::Uuid;

use polychat_types::dispatch::{DispatchRound, ProviderResult, ResultStatus};
use polychat_types::provider::ProviderId;

/// What one provider's card should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardState {
    /// No round has been submitted yet.
    Idle,
    Loading,
    Ready(String),
    Error(String),
}

impl From<&ProviderResult> for CardState {
    fn from(result: &ProviderResult) -> Self {
        match result.status() {
            ResultStatus::Pending => CardState::Loading,
            ResultStatus::Succeeded => CardState::Ready(result.text().unwrap_or_default().to_string()),
            ResultStatus::Failed => {
                CardState::Error(result.error_message().unwrap_or_default().to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentationState {
    providers: Vec<ProviderId>,
    round_id: Option<Uuid>,
    results: Vec<ProviderResult>,
}

impl PresentationState {
    /// Idle state for a provider set; nothing submitted yet.
    pub fn idle(providers: &[ProviderId]) -> Self {
        let mut providers = providers.to_vec();
        providers.sort();
        providers.dedup();
        Self {
            providers,
            round_id: None,
            results: Vec::new(),
        }
    }

    /// Snapshot of a round.
    pub fn from_round(round: &DispatchRound) -> Self {
        Self {
            providers: round.providers().collect(),
            round_id: Some(round.id()),
            results: round.results().cloned().collect(),
        }
    }

    /// Replace the entry for the result's provider.
    ///
    /// Results from any round other than the one on display are dropped,
    /// so a superseded round can never overwrite its successor's cards.
    /// Returns whether the result was applied.
    pub fn apply(&mut self, round_id: Uuid, result: ProviderResult) -> bool {
        if self.round_id != Some(round_id) {
            return false;
        }
        match self
            .results
            .iter_mut()
            .find(|r| r.provider() == result.provider())
        {
            Some(entry) => {
                *entry = result;
                true
            }
            None => false,
        }
    }

    pub fn round_id(&self) -> Option<Uuid> {
        self.round_id
    }

    /// Current round's results in display order; empty before any round.
    pub fn results(&self) -> &[ProviderResult] {
        &self.results
    }

    /// True iff any provider of the current round is still pending.
    pub fn is_busy(&self) -> bool {
        self.results.iter().any(|r| !r.is_terminal())
    }

    /// One card per configured provider, in display order.
    pub fn cards(&self) -> Vec<(ProviderId, CardState)> {
        self.providers
            .iter()
            .map(|&p| {
                let state = self
                    .results
                    .iter()
                    .find(|r| r.provider() == p)
                    .map(CardState::from)
                    .unwrap_or(CardState::Idle);
                (p, state)
            })
            .collect()
    }
}
