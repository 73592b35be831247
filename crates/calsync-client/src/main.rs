//! calsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use calsync_client::cli::{CalendarsAction, Cli, Command, ConfigAction, LedgerAction};
use calsync_client::commands;
use calsync_client::config::ClientConfig;
use calsync_client::error::{ClientError, ClientResult};
use calsync_core::{TracingConfig, init_tracing};

/// Exit code when an add ended without the event in the calendar.
const EXIT_NOT_ADDED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(TracingConfig::cli(cli.debug)) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_NOT_ADDED),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<bool> {
    // Load configuration
    let source = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };
    config.apply_cli(&cli);

    match cli.command {
        Command::Add { ref events } => commands::add::run(events, &config, cli.json).await,
        Command::Check { ref events } => {
            commands::check::run(events, &config, cli.json).await?;
            Ok(true)
        }
        Command::Ledger { action } => match action {
            LedgerAction::List => commands::ledger::list(&config, cli.json).map(|()| true),
        },
        Command::Calendars { action } => match action {
            CalendarsAction::List => commands::calendars::list(&config, cli.json).await.map(|()| true),
            CalendarsAction::Select => {
                commands::calendars::select(&config, cli.json).await.map(|()| true)
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &source).map(|()| true),
            ConfigAction::Validate => commands::config::validate(&config).map(|()| true),
            ConfigAction::Path => commands::config::path(&source).map(|()| true),
        },
    }
}
