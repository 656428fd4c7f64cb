//! Main chat loop.
//!
//! Reads one line at a time; every non-command line becomes a dispatch
//! round. No new line is read while a round is in flight, so rounds never
//! overlap. When the gate denies, the upsell is shown and no provider is
//! called.

use std::sync::Arc;

use console::style;

use polychat_core::dispatch::coordinator::DispatchCoordinator;
use polychat_core::dispatch::gate::UsageGate;
use polychat_core::provider::client::ProviderClient;
use polychat_core::session::SessionStore;
use polychat_infra::session::memory::MemorySessionStore;
use polychat_types::error::DispatchError;
use polychat_types::provider::ProviderId;

use crate::cli::ask::run_round;
use crate::cli::render::{self, RenderOptions};

use super::banner::{print_upsell, print_welcome_banner};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// What the loop should do after handling one line.
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Exit,
}

/// Run the interactive chat loop against `client`.
pub async fn run_chat_loop<C: ProviderClient>(
    client: Arc<C>,
    target: &str,
    free_limit: u32,
    show_timing: bool,
) -> anyhow::Result<()> {
    let gate = UsageGate::new(Arc::new(MemorySessionStore::new()), free_limit);
    let coordinator = DispatchCoordinator::new(client, gate, &ProviderId::ALL);

    print_welcome_banner(
        coordinator.providers(),
        target,
        coordinator.gate().free_limit(),
        coordinator.gate().remaining().await?,
    );

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    let options = RenderOptions {
        show_timing,
        show_remaining: true,
    };

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D or type /quit to exit.").dim());
            }
            InputEvent::Message(text) if text.is_empty() => {}
            InputEvent::Message(text) => {
                if let Some(cmd) = commands::parse(&text) {
                    if cmd == ChatCommand::Clear {
                        chat_input.clear();
                        continue;
                    }
                    if handle_command(&coordinator, cmd).await? == Flow::Exit {
                        break;
                    }
                    continue;
                }

                match run_round(&coordinator, &text, false, options).await {
                    Ok(_) => {}
                    Err(DispatchError::LimitReached { .. }) => print_upsell(),
                    Err(DispatchError::EmptyMessage) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "dispatch failed");
                        println!("\n  {} {e}\n", style("!").red().bold());
                    }
                }
            }
        }
    }

    Ok(())
}

async fn handle_command<C: ProviderClient, S: SessionStore>(
    coordinator: &DispatchCoordinator<C, S>,
    cmd: ChatCommand,
) -> anyhow::Result<Flow> {
    let gate = coordinator.gate();
    match cmd {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::Exit => {
            println!("\n  {}", style("Session ended.").dim());
            return Ok(Flow::Exit);
        }
        ChatCommand::Logout => {
            gate.reset().await?;
            println!(
                "\n  {} Logged out. {} free rounds available.\n",
                style("✓").green().bold(),
                gate.free_limit()
            );
        }
        ChatCommand::Usage => {
            println!(
                "\n  {} of {} free rounds used, {} left.\n",
                gate.attempts_used().await?,
                gate.free_limit(),
                gate.remaining().await?
            );
        }
        ChatCommand::Last => {
            let board = coordinator.presentation();
            if board.round_id().is_none() {
                println!("\n  {}\n", style("Nothing asked yet.").dim());
            } else {
                render::print_board(&board);
            }
        }
        ChatCommand::Clear => {}
        ChatCommand::Unknown(name) => {
            println!(
                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                style("?").yellow().bold(),
                style(name).dim()
            );
        }
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polychat_types::error::ProxyError;

    struct Echo;

    impl ProviderClient for Echo {
        async fn ask(&self, provider: ProviderId, message: &str) -> Result<String, ProxyError> {
            Ok(format!("{provider}: {message}"))
        }
    }

    fn coordinator(limit: u32) -> DispatchCoordinator<Echo, MemorySessionStore> {
        let gate = UsageGate::new(Arc::new(MemorySessionStore::new()), limit);
        DispatchCoordinator::new(Arc::new(Echo), gate, &ProviderId::ALL)
    }

    #[tokio::test]
    async fn logout_reopens_gate() {
        let coordinator = coordinator(1);
        coordinator.submit("hi").await.unwrap();
        assert!(matches!(
            coordinator.submit("again").await,
            Err(DispatchError::LimitReached { free_limit: 1 })
        ));

        let flow = handle_command(&coordinator, ChatCommand::Logout).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(coordinator.submit("again").await.is_ok());
    }

    #[tokio::test]
    async fn exit_stops_loop() {
        let coordinator = coordinator(3);
        let flow = handle_command(&coordinator, ChatCommand::Exit).await.unwrap();
        assert_eq!(flow, Flow::Exit);
    }

    #[tokio::test]
    async fn usage_does_not_consume_rounds() {
        let coordinator = coordinator(2);
        handle_command(&coordinator, ChatCommand::Usage).await.unwrap();
        handle_command(&coordinator, ChatCommand::Last).await.unwrap();
        assert_eq!(coordinator.gate().remaining().await.unwrap(), 2);
    }
}
