// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpline - terminal client for the customer-service assistant.
//!
//! This is the binary entry point.

mod account;
mod shell;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use helpline_api::ApiClient;
use helpline_config::HelplineConfig;
use helpline_core::HelplineError;
use helpline_store::{AuthContext, ConversationStore, FileTokenStore};
use helpline_ws::{TransportConfig, WsTransport};

/// Helpline - terminal client for the customer-service assistant.
#[derive(Parser, Debug)]
#[command(name = "helpline", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session (the default).
    Chat {
        /// Wait for complete replies instead of streaming them.
        #[arg(long)]
        blocking: bool,
    },
    /// Sign in and remember the access token.
    Login {
        #[arg(short, long)]
        username: String,
    },
    /// Forget the saved access token.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Check that the backend is reachable.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => helpline_config::load_and_validate_path(path),
        None => helpline_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            helpline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let result = match cli.command.unwrap_or(Commands::Chat { blocking: false }) {
        Commands::Chat { blocking } => match build_store(&config) {
            Ok(store) => shell::run_chat(store, blocking).await,
            Err(e) => Err(e),
        },
        Commands::Login { username } => match build_store(&config) {
            Ok(mut store) => account::login(&mut store, &username).await,
            Err(e) => Err(e),
        },
        Commands::Logout => build_store(&config).map(|mut store| account::logout(&mut store)),
        Commands::Whoami => match build_store(&config) {
            Ok(mut store) => account::whoami(&mut store).await,
            Err(e) => Err(e),
        },
        Commands::Status { json } => status::run_status(&config, json).await,
        Commands::Config => print_config(&config),
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Wires the REST client, WebSocket transport and token file into a store.
fn build_store(config: &HelplineConfig) -> Result<ConversationStore, HelplineError> {
    let backend = Arc::new(ApiClient::from_config(config)?);
    let transport = Arc::new(WsTransport::new(&TransportConfig::from_config(config)?));
    let auth = AuthContext::restore(Arc::new(FileTokenStore::from_config(&config.auth)));

    Ok(ConversationStore::new(transport, backend, auth)
        .with_inactivity_timeout(config.stream.inactivity_timeout()))
}

fn print_config(config: &HelplineConfig) -> Result<(), HelplineError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| HelplineError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so they never interleave with a streamed reply.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helpline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
