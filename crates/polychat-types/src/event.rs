//! Events published while a dispatch round is in flight.
//!
//! `DispatchEvent` is broadcast by the coordinator so renderers can update
//! each provider's card as soon as that provider settles. All variants are
//! Clone + Send + Sync for use with tokio broadcast channels.

use serde::Serialize;
use uuid::Uuid;

use crate::dispatch::ProviderResult;
use crate::provider::ProviderId;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// Every provider call for the round has been issued.
    RoundStarted {
        round_id: Uuid,
        providers: Vec<ProviderId>,
    },

    /// One provider reached a terminal state.
    ProviderSettled {
        round_id: Uuid,
        result: ProviderResult,
        elapsed_ms: u64,
    },

    /// All providers settled and the attempt has been recorded.
    RoundSettled {
        round_id: Uuid,
        failures: usize,
        attempts_used: u32,
        remaining: u32,
    },
}

impl DispatchEvent {
    pub fn round_id(&self) -> Uuid {
        match self {
            DispatchEvent::RoundStarted { round_id, .. }
            | DispatchEvent::ProviderSettled { round_id, .. }
            | DispatchEvent::RoundSettled { round_id, .. } => *round_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_tag() {
        let event = DispatchEvent::ProviderSettled {
            round_id: Uuid::now_v7(),
            result: ProviderResult::succeeded(ProviderId::Gemini, "hi"),
            elapsed_ms: 12,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "provider_settled");
        assert_eq!(json["result"]["provider"], "gemini");
    }
}
