//! Dispatch coordinator: one message, every provider, in parallel.
//!
//! A round is validated and gated first; nothing is created and no
//! provider is called when either check fails. Otherwise every provider
//! call is spawned into a `JoinSet` before any of them is awaited, each
//! task reports exactly its own provider's outcome, and the round settles
//! at the join barrier. Only then is the attempt recorded, once, whatever
//! the mix of successes and failures.
//!
//! Progress is published two ways: a `watch` channel carrying the latest
//! [`PresentationState`], and a `broadcast` channel of [`DispatchEvent`]s.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;

use polychat_types::dispatch::{DispatchRound, ProviderResult};
use polychat_types::error::{DispatchError, ProxyError};
use polychat_types::event::DispatchEvent;
use polychat_types::provider::ProviderId;

use super::gate::UsageGate;
use super::presentation::PresentationState;
use crate::provider::client::ProviderClient;
use crate::session::SessionStore;

const EVENT_BUFFER: usize = 64;

/// Message recorded for a provider whose task ended without reporting.
const TASK_LOST_MESSAGE: &str = "provider task ended unexpectedly";

pub struct DispatchCoordinator<C, S> {
    client: Arc<C>,
    gate: UsageGate<S>,
    providers: Vec<ProviderId>,
    board: watch::Sender<PresentationState>,
    events: broadcast::Sender<DispatchEvent>,
}

impl<C: ProviderClient, S: SessionStore> DispatchCoordinator<C, S> {
    /// Create a coordinator for a fixed provider set.
    pub fn new(client: Arc<C>, gate: UsageGate<S>, providers: &[ProviderId]) -> Self {
        let mut providers = providers.to_vec();
        providers.sort();
        providers.dedup();

        let (board, _) = watch::channel(PresentationState::idle(&providers));
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            client,
            gate,
            providers,
            board,
            events,
        }
    }

    pub fn gate(&self) -> &UsageGate<S> {
        &self.gate
    }

    pub fn providers(&self) -> &[ProviderId] {
        &self.providers
    }

    /// Latest presentation snapshot.
    pub fn presentation(&self) -> PresentationState {
        self.board.borrow().clone()
    }

    /// Receiver that observes every presentation update.
    pub fn watch_presentation(&self) -> watch::Receiver<PresentationState> {
        self.board.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.events.subscribe()
    }

    /// Run one round to completion and return it settled.
    ///
    /// Fails before any provider call when the message is blank or the
    /// gate denies. Provider failures never fail the round; they become
    /// failed entries. A session store that cannot record the attempt is
    /// logged and the settled round is still returned, without a
    /// `RoundSettled` event.
    ///
    /// Rounds may overlap; the presentation only ever shows the most
    /// recently started one.
    pub async fn submit(&self, message: &str) -> Result<DispatchRound, DispatchError> {
        if message.trim().is_empty() {
            return Err(DispatchError::EmptyMessage);
        }
        if !self.gate.can_dispatch().await? {
            tracing::info!(free_limit = self.gate.free_limit(), "dispatch denied by usage gate");
            return Err(DispatchError::LimitReached {
                free_limit: self.gate.free_limit(),
            });
        }

        let mut round = DispatchRound::new(message, &self.providers)?;
        let round_id = round.id();
        self.board.send_replace(PresentationState::from_round(&round));

        let mut tasks = JoinSet::new();
        for provider in round.providers() {
            let client = Arc::clone(&self.client);
            let message = round.message().to_string();
            tasks.spawn(async move {
                let start = Instant::now();
                let outcome = client.ask(provider, &message).await;
                (provider, outcome, start.elapsed().as_millis() as u64)
            });
        }

        tracing::info!(round_id = %round_id, providers = self.providers.len(), "dispatch round started");
        let _ = self.events.send(DispatchEvent::RoundStarted {
            round_id,
            providers: self.providers.clone(),
        });

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((provider, outcome, elapsed_ms)) => {
                    let result = into_result(provider, outcome);
                    self.settle(&mut round, result, elapsed_ms);
                }
                Err(e) => {
                    // Which provider it was is swept up after the join.
                    tracing::error!(round_id = %round_id, error = %e, "provider task failed to join");
                }
            }
        }

        let lost: Vec<ProviderId> = round
            .results()
            .filter(|r| !r.is_terminal())
            .map(|r| r.provider())
            .collect();
        for provider in lost {
            self.settle(&mut round, ProviderResult::failed(provider, TASK_LOST_MESSAGE), 0);
        }

        let failures = round.failure_count();
        match self.gate.record_attempt().await {
            Ok(attempts_used) => {
                let remaining = self.gate.free_limit().saturating_sub(attempts_used);
                tracing::info!(
                    round_id = %round_id,
                    failures,
                    attempts_used,
                    remaining,
                    "dispatch round settled"
                );
                let _ = self.events.send(DispatchEvent::RoundSettled {
                    round_id,
                    failures,
                    attempts_used,
                    remaining,
                });
            }
            Err(e) => {
                // The answers are already in; only the counter is lost.
                tracing::error!(round_id = %round_id, failures, error = %e, "failed to record attempt");
            }
        }

        Ok(round)
    }

    fn settle(&self, round: &mut DispatchRound, result: ProviderResult, elapsed_ms: u64) {
        if !round.apply(result.clone()) {
            return;
        }
        tracing::debug!(
            round_id = %round.id(),
            provider = %result.provider(),
            status = %result.status(),
            elapsed_ms,
            "provider settled"
        );
        let round_id = round.id();
        self.board.send_if_modified(|state| state.apply(round_id, result.clone()));
        let _ = self.events.send(DispatchEvent::ProviderSettled {
            round_id,
            result,
            elapsed_ms,
        });
    }
}

fn into_result(provider: ProviderId, outcome: Result<String, ProxyError>) -> ProviderResult {
    match outcome {
        Ok(text) => ProviderResult::succeeded(provider, text),
        Err(e) => ProviderResult::failed(provider, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::test_support::{MemoryStore, MockClient, ReadOnlyStore};
    use polychat_types::dispatch::ResultStatus;
    use std::time::Duration;

    fn coordinator(client: MockClient, limit: u32) -> DispatchCoordinator<MockClient, MemoryStore> {
        let gate = UsageGate::new(Arc::new(MemoryStore::default()), limit);
        DispatchCoordinator::new(Arc::new(client), gate, &ProviderId::ALL)
    }

    fn assert_all_terminal(round: &DispatchRound) {
        assert_eq!(round.results().count(), ProviderId::ALL.len());
        assert!(round.is_settled());
    }

    #[tokio::test]
    async fn all_succeed_counts_one_attempt() {
        let client = MockClient::new();
        let coord = coordinator(client.clone(), 3);

        let round = coord.submit("hello").await.unwrap();

        assert_all_terminal(&round);
        assert!(round.results().all(|r| r.status() == ResultStatus::Succeeded));
        assert_eq!(
            round.result(ProviderId::Gemini).unwrap().text(),
            Some("gemini says hello")
        );
        assert_eq!(coord.gate().attempts_used().await.unwrap(), 1);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn attempt_counted_once_with_one_failure() {
        let client = MockClient::new().fail(
            ProviderId::OpenAi,
            ProxyError::Upstream {
                provider: ProviderId::OpenAi,
                status: 401,
                message: "Invalid key".into(),
            },
        );
        let coord = coordinator(client, 3);

        let round = coord.submit("hello").await.unwrap();

        assert_all_terminal(&round);
        let openai = round.result(ProviderId::OpenAi).unwrap();
        assert_eq!(openai.status(), ResultStatus::Failed);
        assert_eq!(openai.error_message(), Some("Invalid key"));
        assert!(openai.text().is_none());
        for p in [ProviderId::Gemini, ProviderId::Perplexity] {
            assert_eq!(round.result(p).unwrap().status(), ResultStatus::Succeeded);
        }
        assert_eq!(coord.gate().attempts_used().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn attempt_counted_once_when_all_fail() {
        let mut client = MockClient::new();
        for p in ProviderId::ALL {
            client = client.fail(
                p,
                ProxyError::Transport {
                    provider: p,
                    message: "connection refused".into(),
                },
            );
        }
        let coord = coordinator(client, 3);

        let round = coord.submit("hello").await.unwrap();

        assert_all_terminal(&round);
        assert_eq!(round.failure_count(), 3);
        assert_eq!(coord.gate().attempts_used().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failure_does_not_change_siblings() {
        let healthy = coordinator(MockClient::new(), 5).submit("same").await.unwrap();
        let broken = coordinator(
            MockClient::new().fail(
                ProviderId::Gemini,
                ProxyError::Timeout {
                    provider: ProviderId::Gemini,
                    timeout_secs: 30,
                },
            ),
            5,
        )
        .submit("same")
        .await
        .unwrap();

        for p in [ProviderId::OpenAi, ProviderId::Perplexity] {
            assert_eq!(healthy.result(p).unwrap().status(), broken.result(p).unwrap().status());
            assert_eq!(healthy.result(p).unwrap().text(), broken.result(p).unwrap().text());
        }
        assert_eq!(
            broken.result(ProviderId::Gemini).unwrap().error_message(),
            Some("gemini request timed out after 30s")
        );
    }

    #[tokio::test]
    async fn whitespace_message_is_rejected_without_calls() {
        let client = MockClient::new();
        let coord = coordinator(client.clone(), 3);

        let err = coord.submit("   ").await.unwrap_err();

        assert!(matches!(err, DispatchError::EmptyMessage));
        assert_eq!(client.calls(), 0);
        assert_eq!(coord.gate().attempts_used().await.unwrap(), 0);
        assert!(coord.presentation().round_id().is_none());
    }

    #[tokio::test]
    async fn fourth_round_rejected_at_limit_of_three() {
        let client = MockClient::new();
        let coord = coordinator(client.clone(), 3);

        for msg in ["one", "two", "three"] {
            coord.submit(msg).await.unwrap();
        }
        assert!(!coord.gate().can_dispatch().await.unwrap());
        assert_eq!(client.calls(), 9);

        let err = coord.submit("four").await.unwrap_err();
        assert!(matches!(err, DispatchError::LimitReached { free_limit: 3 }));
        assert_eq!(client.calls(), 9);
        assert_eq!(coord.gate().attempts_used().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn reset_reopens_the_gate() {
        let coord = coordinator(MockClient::new(), 1);
        coord.submit("one").await.unwrap();
        assert!(coord.submit("two").await.is_err());

        coord.gate().reset().await.unwrap();
        assert!(coord.submit("two").await.is_ok());
    }

    #[tokio::test]
    async fn calls_run_concurrently() {
        let client = MockClient::new().with_delay(Duration::from_millis(200));
        let coord = coordinator(client, 3);

        let start = Instant::now();
        coord.submit("hello").await.unwrap();

        // Serial execution would take at least 600ms.
        assert!(start.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn slow_provider_settles_after_fast_ones() {
        let client = MockClient::new().delay_for(ProviderId::OpenAi, Duration::from_millis(150));
        let coord = coordinator(client, 3);
        let mut events = coord.subscribe();

        let round = coord.submit("hello").await.unwrap();
        assert_all_terminal(&round);

        let mut settled_order = Vec::new();
        let mut saw_round_settled = false;
        while let Ok(event) = events.try_recv() {
            assert_eq!(event.round_id(), round.id());
            match event {
                DispatchEvent::ProviderSettled { result, .. } => settled_order.push(result.provider()),
                DispatchEvent::RoundSettled { attempts_used, remaining, failures, .. } => {
                    assert_eq!(attempts_used, 1);
                    assert_eq!(remaining, 2);
                    assert_eq!(failures, 0);
                    saw_round_settled = true;
                }
                DispatchEvent::RoundStarted { providers, .. } => {
                    assert_eq!(providers, ProviderId::ALL.to_vec());
                }
            }
        }
        assert_eq!(settled_order.len(), 3);
        assert_eq!(settled_order.last(), Some(&ProviderId::OpenAi));
        assert!(saw_round_settled);

        // Presentation keeps display order regardless.
        let presented: Vec<_> = coord.presentation().results().iter().map(|r| r.provider()).collect();
        assert_eq!(presented, ProviderId::ALL.to_vec());
        assert!(!coord.presentation().is_busy());
    }

    #[tokio::test]
    async fn presentation_is_busy_while_in_flight() {
        let client = MockClient::new().with_delay(Duration::from_millis(100));
        let coord = Arc::new(coordinator(client, 3));
        let mut board = coord.watch_presentation();

        let runner = Arc::clone(&coord);
        let handle = tokio::spawn(async move { runner.submit("hello").await });

        board.changed().await.unwrap();
        assert!(board.borrow_and_update().is_busy());

        handle.await.unwrap().unwrap();
        assert!(!coord.presentation().is_busy());
    }

    #[tokio::test]
    async fn panicking_provider_becomes_failed_entry() {
        let client = MockClient::new().panic_on(ProviderId::Perplexity);
        let coord = coordinator(client, 3);

        let round = coord.submit("hello").await.unwrap();

        assert_all_terminal(&round);
        let entry = round.result(ProviderId::Perplexity).unwrap();
        assert_eq!(entry.status(), ResultStatus::Failed);
        assert_eq!(entry.error_message(), Some(TASK_LOST_MESSAGE));
        assert_eq!(round.result(ProviderId::OpenAi).unwrap().status(), ResultStatus::Succeeded);
        assert_eq!(coord.gate().attempts_used().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn superseded_round_does_not_overwrite_current_board() {
        let client = MockClient::new().with_delay(Duration::from_millis(300));
        let coord = Arc::new(coordinator(client, 5));

        let first = Arc::clone(&coord);
        let round_a = tokio::spawn(async move { first.submit("A").await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = Arc::clone(&coord);
        let round_b = tokio::spawn(async move { second.submit("B").await });

        let a = round_a.await.unwrap().unwrap();
        assert!(a.is_settled());

        // A has settled, B is still in flight and owns the board.
        let board = coord.presentation();
        assert_ne!(board.round_id(), Some(a.id()));
        assert!(board.is_busy());
        assert!(board.results().iter().all(|r| !r.is_terminal()));

        let b = round_b.await.unwrap().unwrap();
        let board = coord.presentation();
        assert_eq!(board.round_id(), Some(b.id()));
        assert!(!board.is_busy());
        assert_eq!(board.results()[0].text(), Some("openai says B"));
        assert_eq!(coord.gate().attempts_used().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn settled_round_survives_counter_write_failure() {
        let gate = UsageGate::new(Arc::new(ReadOnlyStore), 3);
        let coord = DispatchCoordinator::new(Arc::new(MockClient::new()), gate, &ProviderId::ALL);
        let mut events = coord.subscribe();

        let round = coord.submit("hello").await.unwrap();

        assert_all_terminal(&round);
        assert_eq!(round.failure_count(), 0);
        let mut saw_round_settled = false;
        while let Ok(event) = events.try_recv() {
            saw_round_settled |= matches!(event, DispatchEvent::RoundSettled { .. });
        }
        assert!(!saw_round_settled);
        assert!(!coord.presentation().is_busy());
    }
}
