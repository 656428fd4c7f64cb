//! polychat CLI and provider proxy entry point.
//!
//! Binary name: `polychat`
//!
//! Parses CLI arguments, loads configuration, then either starts the proxy
//! server or runs one of the client commands against a proxy (or directly
//! against the providers with `--direct`).

mod cli;
mod http;
mod state;

use std::sync::Arc;

use clap::Parser;
use clap_complete::generate;
use console::style;

use polychat_core::provider::client::ProviderClient;
use polychat_infra::client::http::HttpProxyClient;
use polychat_infra::config::load_config;
use polychat_infra::llm::build_registry;
use polychat_infra::secret::Credentials;
use polychat_observe::tracing_setup::{init_tracing, shutdown_tracing};
use polychat_types::config::ProxyConfig;
use polychat_types::provider::ProviderId;

use cli::{ClientArgs, Cli, Commands};
use state::ProxyState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions need nothing else
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "polychat", &mut std::io::stdout());
        return Ok(());
    }

    let serving = matches!(cli.command, Commands::Serve { .. });
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 if serving => "info",
        0 => "warn",
        1 => "info,polychat=debug",
        _ => "trace",
    };
    init_tracing(filter, cli.otel).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let config = load_config(&cli.config).await;
    let result = run(cli, config).await;

    shutdown_tracing();
    result
}

async fn run(cli: Cli, mut config: ProxyConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(config).await?;
        }

        Commands::Ask { message, client } => {
            let message = message.join(" ");
            let verbose = cli.verbose > 0;
            if client.direct {
                let client = direct_client(&config)?;
                cli::ask::ask(client, &message, cli.json, verbose).await?;
            } else {
                let client = Arc::new(HttpProxyClient::for_config(client.proxy_url, &config)?);
                cli::ask::ask(client, &message, cli.json, verbose).await?;
            }
        }

        Commands::Chat { client, free_limit } => {
            let free_limit = free_limit.unwrap_or(config.usage.free_limit);
            let verbose = cli.verbose > 0;
            if client.direct {
                chat(direct_client(&config)?, "direct (local credentials)", free_limit, verbose).await?;
            } else {
                let ClientArgs { proxy_url, .. } = client;
                let client = HttpProxyClient::for_config(proxy_url.clone(), &config)?;
                chat(Arc::new(client), &proxy_url, free_limit, verbose).await?;
            }
        }

        Commands::Status { proxy_url } => {
            cli::status::status(&proxy_url, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn chat<C: ProviderClient>(client: Arc<C>, target: &str, free_limit: u32, verbose: bool) -> anyhow::Result<()> {
    cli::chat::loop_runner::run_chat_loop(client, target, free_limit, verbose).await
}

/// In-process registry using the caller's own credentials.
fn direct_client(config: &ProxyConfig) -> anyhow::Result<Arc<polychat_core::provider::registry::ProviderRegistry>> {
    let credentials = Credentials::from_env();
    warn_missing(&credentials);
    Ok(Arc::new(build_registry(config, &credentials)?))
}

fn warn_missing(credentials: &Credentials) {
    for id in credentials.missing() {
        tracing::warn!(provider = %id, env_var = %id.api_key_env(), "no credential configured");
    }
}

async fn serve(config: ProxyConfig) -> anyhow::Result<()> {
    let credentials = Credentials::from_env();
    for id in ProviderId::ALL {
        if credentials.is_present(id) {
            tracing::info!(provider = %id, "credential loaded");
        }
    }
    warn_missing(&credentials);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = ProxyState::init(config, &credentials)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} polychat proxy listening on {}",
        style("◆").cyan().bold(),
        style(format!("http://{addr}")).cyan()
    );
    println!("  {}", style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
