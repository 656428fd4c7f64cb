//! CLI command definitions for the `polychat` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod chat;
pub mod render;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use polychat_infra::client::http::DEFAULT_PROXY_URL;
use polychat_infra::config::CONFIG_FILE_NAME;

/// Ask several AI providers the same question at once.
#[derive(Parser)]
#[command(name = "polychat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Path to the optional config file.
    #[arg(long, global = true, env = "POLYCHAT_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// How the client reaches providers.
#[derive(clap::Args, Debug, Clone)]
pub struct ClientArgs {
    /// Base URL of a running polychat proxy.
    #[arg(long, env = "POLYCHAT_PROXY_URL", default_value = DEFAULT_PROXY_URL)]
    pub proxy_url: String,

    /// Call providers in-process with local credentials instead of a proxy.
    #[arg(long)]
    pub direct: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the provider proxy server.
    Serve {
        /// Port to listen on (overrides PORT and the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Interface to bind.
        #[arg(long)]
        host: Option<String>,
    },

    /// Send one message to every provider and print the answers.
    Ask {
        /// The message to send.
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        message: Vec<String>,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Interactive session with a free-tier round limit.
    Chat {
        #[command(flatten)]
        client: ClientArgs,

        /// Rounds allowed before the upsell (overrides POLYCHAT_FREE_LIMIT).
        #[arg(long)]
        free_limit: Option<u32>,
    },

    /// Show which providers have credentials.
    Status {
        /// Base URL of a running polychat proxy.
        #[arg(long, env = "POLYCHAT_PROXY_URL", default_value = DEFAULT_PROXY_URL)]
        proxy_url: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
