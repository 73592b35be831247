//! Command-line interface definition.

use std::path::PathBuf;

use calsync_engine::Platform;
use clap::{Parser, Subcommand};

/// calsync - Add events to your calendar exactly once
#[derive(Debug, Parser)]
#[command(name = "calsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "CALSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Calendar platform conventions (ios or android)
    #[arg(long, global = true)]
    pub platform: Option<Platform>,

    /// Directory holding the local calendars
    #[arg(long, global = true, env = "CALSYNC_CALENDAR_DIR")]
    pub calendar_dir: Option<PathBuf>,

    /// Path to the sync ledger file
    #[arg(long, global = true, env = "CALSYNC_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Skip the duplicate sweep over existing entries
    #[arg(long, global = true)]
    pub no_sweep: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add events to the calendar unless already present
    Add {
        /// JSON file with one event or an array of events ("-" for stdin)
        events: PathBuf,
    },

    /// Show the sync key of events and whether they are recorded as synced
    Check {
        /// JSON file with one event or an array of events ("-" for stdin)
        events: PathBuf,
    },

    /// Sync ledger commands
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },

    /// Calendar commands
    Calendars {
        #[command(subcommand)]
        action: CalendarsAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Ledger actions.
#[derive(Debug, Subcommand)]
pub enum LedgerAction {
    /// List synced event keys
    List,
}

/// Calendar actions.
#[derive(Debug, Subcommand)]
pub enum CalendarsAction {
    /// List available calendars
    List,

    /// Show which calendar new events would be added to
    Select,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
