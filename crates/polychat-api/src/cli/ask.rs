//! One-shot `polychat ask`.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Instrument;

use polychat_core::dispatch::coordinator::DispatchCoordinator;
use polychat_core::dispatch::gate::UsageGate;
use polychat_core::provider::client::ProviderClient;
use polychat_core::session::SessionStore;
use polychat_infra::session::memory::MemorySessionStore;
use polychat_observe::genai_attrs::dispatch_span;
use polychat_types::dispatch::DispatchRound;
use polychat_types::error::DispatchError;
use polychat_types::event::DispatchEvent;
use polychat_types::provider::ProviderId;

use super::render::{self, RenderOptions};

/// Submit one round and, unless `quiet`, print each card as it settles.
pub async fn run_round<C: ProviderClient, S: SessionStore>(
    coordinator: &DispatchCoordinator<C, S>,
    message: &str,
    quiet: bool,
    options: RenderOptions,
) -> Result<DispatchRound, DispatchError> {
    let mut events = coordinator.subscribe();
    let spinner = (!quiet).then(|| thinking_spinner(coordinator.providers().len()));

    let submit = coordinator
        .submit(message)
        .instrument(dispatch_span(coordinator.providers().len()));
    tokio::pin!(submit);

    let show = |event: &DispatchEvent| {
        if let Some(spinner) = &spinner {
            spinner.suspend(|| render::print_event(event, options));
        }
    };

    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome,
            Ok(event) = events.recv(), if spinner.is_some() => show(&event),
        }
    };
    while let Ok(event) = events.try_recv() {
        show(&event);
    }

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    outcome
}

fn thinking_spinner(providers: usize) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(format!("waiting for {providers} providers..."));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Ask every provider once and print the answers.
pub async fn ask<C: ProviderClient>(client: Arc<C>, message: &str, json: bool, verbose: bool) -> anyhow::Result<()> {
    let gate = UsageGate::new(Arc::new(MemorySessionStore::new()), 1);
    let coordinator = DispatchCoordinator::new(client, gate, &ProviderId::ALL);

    let options = RenderOptions {
        show_timing: verbose,
        show_remaining: false,
    };
    let round = match run_round(&coordinator, message, json, options).await {
        Ok(round) => round,
        Err(DispatchError::EmptyMessage) => {
            anyhow::bail!("message is empty");
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&round)?);
    } else if round.failure_count() == round.providers().count() {
        println!("  {}", style("No provider answered.").red().bold());
        println!();
    }
    Ok(())
}
