mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use deskly_core::SessionExpiryHandler;

use crate::cli::{Cli, Command};
use crate::commands::Session;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a backend connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "deskly", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the backend
        cmd => {
            let session = connect(&cli.global)?;
            tracing::debug!(command = ?cmd, profile = %session.profile, "dispatching command");
            commands::dispatch(cmd, &session, &cli.global).await
        }
    }
}

/// Build a client from the config file, profile, and CLI overrides.
fn connect(global: &cli::GlobalOpts) -> Result<Session, CliError> {
    let cfg = config::load_config_or_default();
    let (client_config, profile) = config::resolve_client_config(global, &cfg)?;

    let on_expired: SessionExpiryHandler = {
        let profile = profile.clone();
        Arc::new(move || {
            tracing::warn!(%profile, "session expired; stored token was cleared");
        })
    };
    let (client, _token) = client_config.connect(Some(on_expired))?;

    Ok(Session {
        client,
        profile,
        fetch_page_size: client_config.fetch_page_size,
        page_size: cfg.defaults.page_size,
    })
}
