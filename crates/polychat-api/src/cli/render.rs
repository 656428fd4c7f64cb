//! Terminal rendering of provider cards.
//!
//! While a round is in flight each provider's card is printed as soon as
//! its event arrives, so cards appear in completion order. The full board
//! (`print_board`) is always in display order.

use console::style;

use polychat_core::dispatch::presentation::{CardState, PresentationState};
use polychat_types::dispatch::{ProviderResult, ResultStatus};
use polychat_types::event::DispatchEvent;
use polychat_types::provider::ProviderId;

/// Print one provider's card.
pub fn print_card(provider: ProviderId, state: &CardState) {
    let name = style(provider.display_name()).cyan().bold();
    match state {
        CardState::Idle => println!("  {name}  {}", style("waiting for a question").dim()),
        CardState::Loading => println!("  {name}  {}", style("thinking...").dim()),
        CardState::Ready(text) => {
            println!("  {name}");
            for line in text.lines() {
                println!("    {line}");
            }
        }
        CardState::Error(message) => {
            println!("  {name}  {} {}", style("✗").red().bold(), style(message).red());
        }
    }
    println!();
}

pub fn print_result(result: &ProviderResult) {
    print_card(result.provider(), &CardState::from(result));
}

/// Print the whole board in display order.
pub fn print_board(state: &PresentationState) {
    println!();
    for (provider, card) in state.cards() {
        print_card(provider, &card);
    }
}

/// What progress output includes besides the cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Per-provider latency under each answer.
    pub show_timing: bool,
    /// Free rounds left after the round.
    pub show_remaining: bool,
}

/// Render a progress event.
pub fn print_event(event: &DispatchEvent, options: RenderOptions) {
    match event {
        DispatchEvent::RoundStarted { providers, .. } => {
            let names: Vec<_> = providers.iter().map(|p| p.display_name()).collect();
            println!();
            println!("  {} {}", style("→").cyan(), style(format!("Asking {}", names.join(", "))).dim());
            println!();
        }
        DispatchEvent::ProviderSettled {
            result, elapsed_ms, ..
        } => {
            print_result(result);
            if options.show_timing && result.status() == ResultStatus::Succeeded {
                println!("    {}", style(format!("{elapsed_ms} ms")).dim());
                println!();
            }
        }
        DispatchEvent::RoundSettled {
            failures, remaining, ..
        } => {
            print_summary(*failures, options.show_remaining.then_some(*remaining));
        }
    }
}

pub fn print_summary(failures: usize, remaining: Option<u32>) {
    let failures_note = match failures {
        0 => style("all providers answered".to_string()).green(),
        n => style(format!("{n} provider(s) failed")).yellow(),
    };
    match remaining {
        Some(n) => println!("  {}  {}", failures_note, style(format!("{n} free round(s) left")).dim()),
        None => println!("  {failures_note}"),
    }
    println!();
}
